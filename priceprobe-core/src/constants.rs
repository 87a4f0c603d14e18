use std::time::Duration;

/// Total attempt budget for a rate-limited call (first attempt included).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed wait between rate-limited attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);

/// Per-call HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Pause at the end of every virtual-user iteration.
pub const DEFAULT_ITERATION_SLEEP: Duration = Duration::from_millis(2_000);

/// Iterations slower than this fail the latency check.
pub const DEFAULT_LATENCY_THRESHOLD: Duration = Duration::from_millis(2_000);

/// How often the runner re-evaluates the virtual-user ramp schedule.
pub const RAMP_TICK: Duration = Duration::from_millis(250);

/// Default geometry of the response-time chart in rendered reports.
pub const CHART_WIDTH: usize = 50;
pub const CHART_HEIGHT: usize = 10;
