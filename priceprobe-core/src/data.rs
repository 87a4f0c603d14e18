use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::time::{Duration, SystemTime};

/// Terminal result of one logical iteration.
///
/// Retries happen below this layer, so a rate-limited call that eventually
/// succeeds records a single successful outcome.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub timestamp: SystemTime,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration: Duration,
    /// HTTP status, absent for connection/timeout failures.
    pub status: Option<u16>,
    pub success: bool,
    /// Value of the rate-limit-remaining header, when the API sent one.
    pub rate_limit_remaining: Option<u32>,
}

/// One time-boxed ramp target for the virtual-user count.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde_as(as = "DurationSeconds<u64>")]
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// Wall-clock length of the full plan.
pub fn total_duration(stages: &[Stage]) -> Duration {
    stages.iter().map(|s| s.duration).sum()
}

/// Upper bound on the instantaneous virtual-user count.
pub fn max_target(stages: &[Stage]) -> usize {
    stages.iter().map(|s| s.target).max().unwrap_or(0)
}

/// Virtual users that should be running at `elapsed` into the plan.
///
/// Each stage ramps linearly from the previous stage's target to its own over
/// its duration, starting from zero users. Past the final stage the answer is
/// zero. Pure function of its inputs, so the schedule is testable without
/// spawning anything.
pub fn active_users(stages: &[Stage], elapsed: Duration) -> usize {
    let mut offset = Duration::ZERO;
    let mut prev = 0usize;

    for stage in stages {
        let end = offset + stage.duration;
        if elapsed < end {
            let frac = if stage.duration.is_zero() {
                1.0
            } else {
                (elapsed - offset).as_secs_f64() / stage.duration.as_secs_f64()
            };
            let from = prev as f64;
            let to = stage.target as f64;
            return (from + (to - from) * frac).round() as usize;
        }
        prev = stage.target;
        offset = end;
    }

    0
}
