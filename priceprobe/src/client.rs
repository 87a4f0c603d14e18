use priceprobe_core::{RunConfig, DEFAULT_TIMEOUT};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header the remote API uses to advertise its remaining per-window budget.
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-remaining";

#[derive(Debug, Error)]
pub enum RequestError {
    /// HTTP 429. The only error the [`crate::retry::Retrier`] recovers from.
    #[error("rate limited by the remote API (HTTP 429)")]
    RateLimited { remaining: Option<u32> },

    /// Any other non-success status. Never retried by this layer.
    #[error("request failed with HTTP {code}")]
    Status { code: u16 },

    /// Connection or timeout failure with no status code.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl RequestError {
    /// Status code carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::Status { code } => Some(*code),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            Self::Config(_) => None,
        }
    }

    pub fn rate_limit_remaining(&self) -> Option<u32> {
        match self {
            Self::RateLimited { remaining } => *remaining,
            _ => None,
        }
    }
}

/// Everything observed about one completed HTTP exchange.
///
/// Carried whole (status, body, headers of interest) so success checks and
/// failure diagnostics can run after the fact without re-requesting.
#[derive(Debug, Clone)]
pub struct Probe {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub rate_limit_remaining: Option<u32>,
    pub body: String,
}

impl Probe {
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Convert a non-success exchange into the matching [`RequestError`].
    ///
    /// 429 maps to [`RequestError::RateLimited`] so callers can hand the
    /// result straight to a [`crate::retry::Retrier`]; all other non-2xx
    /// statuses surface unchanged as [`RequestError::Status`].
    pub fn ensure_ok(self) -> Result<Self, RequestError> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|_| RequestError::Status { code: self.status })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(RequestError::RateLimited {
                remaining: self.rate_limit_remaining,
            })
        } else if status.is_client_error() || status.is_server_error() {
            Err(RequestError::Status { code: self.status })
        } else {
            Ok(self)
        }
    }
}

/// GET client for the remote price API: base URL, key header, per-call
/// timeout. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// `timeout` defaults to 5s when `None`.
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self, RequestError> {
        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| RequestError::Config(format!("api key is not a valid header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, RequestError> {
        Self::new(&config.base_url, &config.api_key, Some(config.timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one GET and capture the exchange as a [`Probe`].
    ///
    /// Any HTTP status yields `Ok`; only transport failures (connect errors,
    /// timeouts) come back as `Err`. Use [`Probe::ensure_ok`] when a non-2xx
    /// answer should be an error.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Probe, RequestError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await?;

        let url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let rate_limit_remaining = response
            .headers()
            .get(RATE_LIMIT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await?;

        Ok(Probe {
            url,
            status,
            content_type,
            rate_limit_remaining,
            body,
        })
    }
}
