use crate::client::{Probe, RequestError};
use priceprobe_core::DEFAULT_LATENCY_THRESHOLD;
use std::time::Duration;

/// One named pass/fail predicate over a completed iteration.
///
/// Names show up in failure diagnostics, so they read as assertions.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    StatusIs(u16),
    BodyNonEmpty,
    LatencyUnder(Duration),
    ContentTypeContains(&'static str),
    NotRateLimited,
    Custom {
        name: &'static str,
        test: fn(&Probe) -> bool,
    },
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusIs(_) => "status is 200",
            Self::BodyNonEmpty => "response body has data",
            Self::LatencyUnder(_) => "response time OK",
            Self::ContentTypeContains(_) => "correct content type",
            Self::NotRateLimited => "not rate limited",
            Self::Custom { name, .. } => name,
        }
    }

    fn passes(&self, probe: &Probe, latency: Duration) -> bool {
        match self {
            Self::StatusIs(code) => probe.status == *code,
            Self::BodyNonEmpty => !probe.body.trim().is_empty(),
            Self::LatencyUnder(threshold) => latency < *threshold,
            Self::ContentTypeContains(fragment) => probe
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.contains(fragment)),
            Self::NotRateLimited => probe.status != 429,
            Self::Custom { test, .. } => test(probe),
        }
    }
}

/// The classification rule for load-test iterations: ALL checks must hold
/// for an iteration to count as a success.
#[derive(Debug, Clone)]
pub struct SuccessPolicy {
    checks: Vec<Check>,
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        Self::api_default(DEFAULT_LATENCY_THRESHOLD)
    }
}

impl SuccessPolicy {
    pub fn new(checks: Vec<Check>) -> Self {
        Self { checks }
    }

    /// The standard probe of the price API: 200, non-empty JSON, under the
    /// latency threshold, and not rate limited.
    pub fn api_default(latency_threshold: Duration) -> Self {
        Self::new(vec![
            Check::StatusIs(200),
            Check::BodyNonEmpty,
            Check::LatencyUnder(latency_threshold),
            Check::ContentTypeContains("application/json"),
            Check::NotRateLimited,
        ])
    }

    /// Names of the checks the iteration failed; empty means success.
    pub fn evaluate(
        &self,
        result: &Result<Probe, RequestError>,
        latency: Duration,
    ) -> Vec<&'static str> {
        match result {
            Ok(probe) => self
                .checks
                .iter()
                .filter(|check| !check.passes(probe, latency))
                .map(Check::name)
                .collect(),
            // A failed exchange never satisfies the policy; name the closest
            // check so diagnostics stay uniform.
            Err(RequestError::RateLimited { .. }) => vec![Check::NotRateLimited.name()],
            Err(_) => vec!["request completed"],
        }
    }
}
