use crate::RequestOutcome;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Aggregated statistics over all outcomes of a run.
///
/// Built once from the full outcome sequence and read-only afterwards. Rates
/// are `NaN` for an empty run rather than an error; aggregation never fails.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub outcomes: Vec<RequestOutcome>,

    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub error_rate: f64,

    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration_min: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration_max: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration_avg: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration_p50: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration_p90: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub duration_p95: Duration,

    /// Wall-clock span covered by the outcomes.
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub wall_clock: Duration,

    /// Min/avg of the rate-limit-remaining header over the outcomes that
    /// carried it. `None` when no outcome did.
    pub rate_limit_min: Option<u32>,
    pub rate_limit_avg: Option<f64>,
}

impl RunResult {
    pub fn from_outcomes(outcomes: Vec<RequestOutcome>) -> Self {
        let total = outcomes.len() as u64;
        let successes = outcomes.iter().filter(|o| o.success).count() as u64;
        let failures = total - successes;

        let (success_rate, error_rate) = if total == 0 {
            (f64::NAN, f64::NAN)
        } else {
            let rate = successes as f64 / total as f64;
            (rate, 1.0 - rate)
        };

        let mut sorted_ms: Vec<f64> = outcomes
            .iter()
            .map(|o| o.duration.as_secs_f64() * 1e3)
            .collect();
        sorted_ms.sort_by(f64::total_cmp);

        let duration_min = from_ms(sorted_ms.first().copied().unwrap_or(0.0));
        let duration_max = from_ms(sorted_ms.last().copied().unwrap_or(0.0));
        let duration_avg = if sorted_ms.is_empty() {
            Duration::ZERO
        } else {
            from_ms(sorted_ms.iter().sum::<f64>() / sorted_ms.len() as f64)
        };

        let remaining: Vec<u32> = outcomes
            .iter()
            .filter_map(|o| o.rate_limit_remaining)
            .collect();
        let rate_limit_min = remaining.iter().copied().min();
        let rate_limit_avg = if remaining.is_empty() {
            None
        } else {
            Some(remaining.iter().map(|&r| f64::from(r)).sum::<f64>() / remaining.len() as f64)
        };

        let wall_clock = wall_clock(&outcomes);

        Self {
            total,
            successes,
            failures,
            success_rate,
            error_rate,
            duration_min,
            duration_max,
            duration_avg,
            duration_p50: from_ms(percentile(&sorted_ms, 0.50)),
            duration_p90: from_ms(percentile(&sorted_ms, 0.90)),
            duration_p95: from_ms(percentile(&sorted_ms, 0.95)),
            wall_clock,
            rate_limit_min,
            rate_limit_avg,
            outcomes,
        }
    }
}

fn from_ms(ms: f64) -> Duration {
    Duration::from_secs_f64(ms / 1e3)
}

fn wall_clock(outcomes: &[RequestOutcome]) -> Duration {
    let start = outcomes.iter().map(|o| o.timestamp).min();
    let end = outcomes
        .iter()
        .filter_map(|o| o.timestamp.checked_add(o.duration))
        .max();

    match (start, end) {
        (Some(start), Some(end)) => end.duration_since(start).unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    }
}

/// Rank-interpolated percentile (the R-7 estimate) over a sorted sample.
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = quantile * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}
