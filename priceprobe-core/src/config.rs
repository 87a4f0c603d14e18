use crate::constants::*;
use crate::Stage;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Paths of the remote endpoints the harness exercises.
pub mod endpoints {
    pub const PING: &str = "/ping";
    pub const SIMPLE_PRICE: &str = "/simple/price";
    pub const COINS_MARKETS: &str = "/coins/markets";
    pub const COINS_LIST: &str = "/coins/list";
}

/// Full configuration surface for a run.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub base_url: String,
    pub api_key: String,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,

    #[serde(default = "RunConfig::default_profile")]
    pub stages: Vec<Stage>,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_iteration_sleep")]
    pub iteration_sleep: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_latency_threshold")]
    pub latency_threshold: Duration,
}

impl RunConfig {
    /// Load from `PRICEPROBE_`-prefixed environment variables
    /// (`PRICEPROBE_BASE_URL`, `PRICEPROBE_API_KEY`, ...).
    pub fn from_env() -> Result<Self, envy::Error> {
        let env: EnvConfig = envy::prefixed("PRICEPROBE_").from_env()?;
        Ok(env.into())
    }

    /// The warm-up / load / stress / cool-down profile used against the live
    /// API. With the 2s iteration sleep, 5 users stay near 25 req/min, under
    /// the 30 req/min demo limit; the 7-user stress stages intentionally push
    /// past it.
    pub fn default_profile() -> Vec<Stage> {
        let minute = Duration::from_secs(60);
        vec![
            Stage::new(minute, 3),
            Stage::new(2 * minute, 3),
            Stage::new(minute, 5),
            Stage::new(2 * minute, 5),
            Stage::new(minute, 7),
            Stage::new(2 * minute, 7),
            Stage::new(minute, 0),
        ]
    }
}

/// Environment-variable surface. Only the connection knobs are exposed this
/// way; stage plans come from code or captured config files.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    api_key: String,
    timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    iteration_sleep_ms: Option<u64>,
}

impl From<EnvConfig> for RunConfig {
    fn from(env: EnvConfig) -> Self {
        Self {
            base_url: env.base_url,
            api_key: env.api_key,
            timeout: env.timeout_ms.map_or(DEFAULT_TIMEOUT, Duration::from_millis),
            max_retries: env.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: env
                .retry_delay_ms
                .map_or(DEFAULT_RETRY_DELAY, Duration::from_millis),
            stages: RunConfig::default_profile(),
            iteration_sleep: env
                .iteration_sleep_ms
                .map_or(DEFAULT_ITERATION_SLEEP, Duration::from_millis),
            latency_threshold: DEFAULT_LATENCY_THRESHOLD,
        }
    }
}

fn default_base_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_iteration_sleep() -> Duration {
    DEFAULT_ITERATION_SLEEP
}

fn default_latency_threshold() -> Duration {
    DEFAULT_LATENCY_THRESHOLD
}
