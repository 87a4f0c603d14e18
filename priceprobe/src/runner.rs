use crate::checks::SuccessPolicy;
use crate::client::{Probe, RequestError};
use metrics_util::AtomicBucket;
use priceprobe_core::{active_users, total_duration, RequestOutcome, Stage, RAMP_TICK};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const DIAGNOSTIC_BODY_LIMIT: usize = 256;

/// Runs the staged virtual-user plan: a vector of looping tasks grown and
/// shrunk to match the ramp schedule, all appending into one lock-free
/// outcome bucket.
pub(crate) struct LoadRunner<T> {
    work: T,
    tasks: Vec<JoinHandle<()>>,
    shared: Arc<VuShared>,
}

struct VuShared {
    outcomes: AtomicBucket<RequestOutcome>,
    policy: SuccessPolicy,
    iteration_sleep: Duration,
}

impl<T, F> LoadRunner<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<Probe, RequestError>> + Send + 'static,
{
    pub fn new(work: T, policy: SuccessPolicy, iteration_sleep: Duration) -> Self {
        Self {
            work,
            tasks: vec![],
            shared: Arc::new(VuShared {
                outcomes: AtomicBucket::new(),
                policy,
                iteration_sleep,
            }),
        }
    }

    /// Drive the plan to completion and drain the recorded outcomes.
    pub async fn run(mut self, stages: &[Stage]) -> Vec<RequestOutcome> {
        let total = total_duration(stages);
        let start = Instant::now();

        let mut ticker = interval(RAMP_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // NOTE: The first tick completes instantly, starting the ramp at zero.
        loop {
            ticker.tick().await;
            let elapsed = start.elapsed();
            if elapsed >= total {
                break;
            }
            self.set_concurrency(active_users(stages, elapsed));
        }
        self.set_concurrency(0);

        let mut outcomes = Vec::new();
        self.shared
            .outcomes
            .clear_with(|chunk| outcomes.extend_from_slice(chunk));
        outcomes
    }

    fn set_concurrency(&mut self, concurrency: usize) {
        if self.tasks.len() == concurrency {
            return;
        }

        trace!("Adjusting virtual users: {} -> {concurrency}", self.tasks.len());
        if self.tasks.len() > concurrency {
            for handle in self.tasks.drain(concurrency..) {
                handle.abort();
            }
        } else {
            while self.tasks.len() < concurrency {
                let work = self.work.clone();
                let shared = self.shared.clone();
                self.tasks.push(tokio::spawn(vu_loop(work, shared)));
            }
        }
    }
}

/// One virtual user: work, classify, record, sleep — until aborted.
async fn vu_loop<T, F>(work: T, shared: Arc<VuShared>)
where
    T: Fn() -> F,
    F: Future<Output = Result<Probe, RequestError>>,
{
    loop {
        let timestamp = SystemTime::now();
        let start = Instant::now();
        let result = work().await;
        let latency = start.elapsed();

        let failed = shared.policy.evaluate(&result, latency);
        let success = failed.is_empty();

        metrics::histogram!("priceprobe.request_duration").record(latency.as_secs_f64() * 1e3);
        if success {
            metrics::counter!("priceprobe.iterations.success").increment(1);
        } else {
            metrics::counter!("priceprobe.iterations.error").increment(1);
        }

        let (status, rate_limit_remaining) = match &result {
            Ok(probe) => (Some(probe.status), probe.rate_limit_remaining),
            Err(err) => (err.status(), err.rate_limit_remaining()),
        };

        if !success {
            match &result {
                Ok(probe) => warn!(
                    url = %probe.url,
                    status = probe.status,
                    latency_ms = latency.as_millis() as u64,
                    rate_limit_remaining = ?probe.rate_limit_remaining,
                    body = %truncated(&probe.body),
                    failed_checks = ?failed,
                    "iteration failed checks"
                ),
                Err(err) => warn!(
                    status = ?status,
                    latency_ms = latency.as_millis() as u64,
                    error = %err,
                    "iteration failed"
                ),
            }
        }

        shared.outcomes.push(RequestOutcome {
            timestamp,
            duration: latency,
            status,
            success,
            rate_limit_remaining,
        });

        tokio::time::sleep(shared.iteration_sleep).await;
    }
}

fn truncated(body: &str) -> &str {
    let mut end = body.len().min(DIAGNOSTIC_BODY_LIMIT);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
