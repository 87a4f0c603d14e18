//! Local stand-in for the remote price API, faithful to its observable
//! contract: key auth (403), per-key rate limiting (429 with a
//! remaining-budget header), parameter validation (400), and hostile-input
//! rejection (403, never 500). Lets the harness tests run hermetically.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use governor::{
    clock::DefaultClock,
    middleware::StateInformationMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use metrics::counter;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Key the mock accepts; anything else is rejected with 403.
pub const DEMO_API_KEY: &str = "demo-key";

const API_KEY_HEADER: &str = "x-api-key";
const RATE_LIMIT_HEADER: &str = "x-ratelimit-remaining";

type ExchangeLimiter =
    RateLimiter<NotKeyed, InMemoryState, DefaultClock, StateInformationMiddleware>;

#[derive(Clone)]
struct ExchangeState {
    quota_per_minute: u32,
    limiters: Arc<RwLock<HashMap<String, Arc<ExchangeLimiter>>>>,
}

/// Serve the mock on `addr` with the given per-key request budget.
pub async fn run(addr: SocketAddr, quota_per_minute: u32) {
    let app = router(quota_per_minute);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

pub fn router(quota_per_minute: u32) -> Router {
    let state = ExchangeState {
        quota_per_minute,
        limiters: Arc::new(RwLock::new(HashMap::new())),
    };

    Router::new()
        .route("/ping", get(ping))
        .route("/simple/price", get(simple_price))
        .route("/coins/markets", get(coins_markets))
        .route("/coins/list", get(coins_list))
        .with_state(state)
}

/** Reference data **/

struct Coin {
    id: &'static str,
    symbol: &'static str,
    name: &'static str,
    usd_price: f64,
    usd_market_cap: f64,
}

const COINS: &[Coin] = &[
    Coin { id: "bitcoin", symbol: "btc", name: "Bitcoin", usd_price: 67_241.0, usd_market_cap: 1.324e12 },
    Coin { id: "ethereum", symbol: "eth", name: "Ethereum", usd_price: 3_512.0, usd_market_cap: 4.21e11 },
    Coin { id: "tether", symbol: "usdt", name: "Tether", usd_price: 1.0, usd_market_cap: 1.12e11 },
    Coin { id: "solana", symbol: "sol", name: "Solana", usd_price: 172.0, usd_market_cap: 7.9e10 },
    Coin { id: "dogecoin", symbol: "doge", name: "Dogecoin", usd_price: 0.31, usd_market_cap: 4.5e10 },
];

const CURRENCIES: &[(&str, f64)] = &[("usd", 1.0), ("eur", 0.92)];

fn coin(id: &str) -> Option<&'static Coin> {
    COINS.iter().find(|c| c.id == id)
}

fn fx(currency: &str) -> Option<f64> {
    CURRENCIES
        .iter()
        .find(|(name, _)| *name == currency)
        .map(|(_, rate)| *rate)
}

/// The remote API rejects anything that does not look like a coin id list
/// with 403 rather than 500.
fn hostile(ids: &str) -> bool {
    !ids.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | ','))
}

/** Handlers **/

async fn ping(State(state): State<ExchangeState>, headers: HeaderMap) -> Response {
    match gate(&state, &headers) {
        Err(rejection) => rejection,
        Ok(remaining) => with_remaining(remaining, json!({ "status": "online" })),
    }
}

async fn simple_price(
    State(state): State<ExchangeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let remaining = match gate(&state, &headers) {
        Err(rejection) => return rejection,
        Ok(remaining) => remaining,
    };

    let ids = params.get("ids").cloned().unwrap_or_default();
    let currencies = params.get("vs_currencies").cloned().unwrap_or_default();

    if hostile(&ids) {
        return forbidden("invalid request");
    }

    let mut body = serde_json::Map::new();
    for id in ids.split(',').filter(|s| !s.is_empty()) {
        let Some(coin) = coin(id) else {
            return bad_request("invalid coin id");
        };

        let mut prices = serde_json::Map::new();
        for currency in currencies.split(',').filter(|s| !s.is_empty()) {
            let Some(rate) = fx(currency) else {
                return bad_request("invalid vs_currency");
            };
            prices.insert(currency.to_string(), json!(coin.usd_price * rate));
        }
        body.insert(id.to_string(), Value::Object(prices));
    }

    with_remaining(remaining, Value::Object(body))
}

async fn coins_markets(
    State(state): State<ExchangeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let remaining = match gate(&state, &headers) {
        Err(rejection) => return rejection,
        Ok(remaining) => remaining,
    };

    let Some(rate) = params.get("vs_currency").and_then(|c| fx(c)) else {
        return bad_request("invalid vs_currency");
    };

    let ids = params.get("ids").cloned().unwrap_or_default();
    if hostile(&ids) {
        return forbidden("invalid request");
    }

    let selected: Vec<&Coin> = if ids.is_empty() {
        COINS.iter().collect()
    } else {
        COINS
            .iter()
            .filter(|c| ids.split(',').any(|id| id == c.id))
            .collect()
    };

    let per_page = params
        .get("per_page")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(100);

    let rows: Vec<Value> = selected
        .iter()
        .take(per_page)
        .map(|c| {
            json!({
                "id": c.id,
                "symbol": c.symbol,
                "name": c.name,
                "current_price": c.usd_price * rate,
                "market_cap": c.usd_market_cap * rate,
            })
        })
        .collect();

    with_remaining(remaining, Value::Array(rows))
}

async fn coins_list(State(state): State<ExchangeState>, headers: HeaderMap) -> Response {
    match gate(&state, &headers) {
        Err(rejection) => rejection,
        Ok(remaining) => {
            let rows: Vec<Value> = COINS
                .iter()
                .map(|c| json!({ "id": c.id, "symbol": c.symbol, "name": c.name }))
                .collect();
            with_remaining(remaining, Value::Array(rows))
        }
    }
}

/** Gate: auth then rate limit, shared by every route **/

fn gate(state: &ExchangeState, headers: &HeaderMap) -> Result<u32, Response> {
    REQUESTS_SERVED.fetch_add(1, Ordering::Relaxed);
    counter!("mock-exchange.requests").increment(1);

    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if key != DEMO_API_KEY {
        debug!("rejecting request with missing or invalid key");
        return Err(forbidden("invalid or missing api key"));
    }

    let limiter = limiter_for(state, key);
    match limiter.check() {
        Ok(snapshot) => Ok(snapshot.remaining_burst_capacity()),
        Err(_) => {
            debug!("rejecting request over the per-minute budget");
            Err((
                StatusCode::TOO_MANY_REQUESTS,
                [(RATE_LIMIT_HEADER, "0".to_string())],
                Json(json!({ "error": "rate limit exceeded" })),
            )
                .into_response())
        }
    }
}

fn limiter_for(state: &ExchangeState, key: &str) -> Arc<ExchangeLimiter> {
    if let Some(limiter) = state.limiters.read().unwrap().get(key) {
        return limiter.clone();
    }

    let limiter = Arc::new(rate_limiter(state.quota_per_minute));
    state
        .limiters
        .write()
        .unwrap()
        .entry(key.to_string())
        .or_insert(limiter)
        .clone()
}

fn rate_limiter(per_minute: u32) -> ExchangeLimiter {
    RateLimiter::direct(Quota::per_minute(
        NonZeroU32::new(per_minute.max(1)).unwrap(),
    ))
    .with_middleware::<StateInformationMiddleware>()
}

fn with_remaining(remaining: u32, body: Value) -> Response {
    ([(RATE_LIMIT_HEADER, remaining.to_string())], Json(body)).into_response()
}

fn forbidden(message: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/** Request counter, handy for asserting traffic in tests **/

static REQUESTS_SERVED: AtomicU64 = AtomicU64::new(0);

pub fn requests_served() -> u64 {
    REQUESTS_SERVED.load(Ordering::Relaxed)
}
