use crate::client::RequestError;
use priceprobe_core::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use std::future::Future;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Bounded fixed-delay retry for rate-limited calls.
///
/// Only [`RequestError::RateLimited`] is retried; every other failure
/// propagates to the caller unchanged. The delay is deliberately constant
/// rather than exponential: the remote limit window is per-minute, long
/// relative to the delay, so growing the wait buys nothing.
#[derive(Debug, Clone, Copy)]
pub struct Retrier {
    max_retries: u32,
    retry_delay: Duration,
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

enum State<T> {
    Attempting(u32),
    Waiting(u32),
    Succeeded(T),
    Exhausted(RequestError),
}

impl Retrier {
    /// `max_retries` is the total attempt budget, not the number of
    /// re-attempts; zero is rounded up to one attempt.
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Drive `op` through the retry state machine until it succeeds, fails
    /// with a non-retryable error, or exhausts the attempt budget.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, RequestError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut state = State::Attempting(1);

        loop {
            state = match state {
                State::Attempting(attempt) => match op().await {
                    Ok(value) => State::Succeeded(value),
                    Err(RequestError::RateLimited { remaining }) if attempt < self.max_retries => {
                        debug!(attempt, ?remaining, "rate limited, waiting to retry");
                        State::Waiting(attempt)
                    }
                    Err(err) => State::Exhausted(err),
                },
                State::Waiting(attempt) => {
                    tokio::time::sleep(self.retry_delay).await;
                    State::Attempting(attempt + 1)
                }
                State::Succeeded(value) => return Ok(value),
                State::Exhausted(err) => return Err(err),
            };
        }
    }
}
