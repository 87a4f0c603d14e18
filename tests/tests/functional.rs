//! Correctness tests for the price API endpoints, run against the local
//! mock exchange through the retrying client.

mod utils;
#[allow(unused)]
use utils::*;

use priceprobe::prelude::*;

const PORT: u16 = 3101;
// Generous budget so functional assertions never trip the limiter.
const QUOTA: u32 = 6_000;

async fn client() -> ApiClient {
    init(PORT, QUOTA).await;
    ApiClient::new(&base_url(PORT), mock_exchange::DEMO_API_KEY, None).unwrap()
}

#[tokio::test]
async fn simple_price_returns_a_numeric_price_for_a_valid_coin() {
    let client = client().await;
    let retrier = Retrier::default();

    let probe = retrier
        .run(|| async {
            client
                .get(endpoints::SIMPLE_PRICE, &[("ids", "bitcoin"), ("vs_currencies", "usd")])
                .await?
                .ensure_ok()
        })
        .await
        .unwrap();

    assert_eq!(probe.status, 200);
    let body = probe.json().unwrap();
    assert!(body["bitcoin"]["usd"].is_number());
}

#[tokio::test]
async fn simple_price_rejects_an_unknown_coin() {
    let client = client().await;

    let result = client
        .get(
            endpoints::SIMPLE_PRICE,
            &[("ids", "invalid_coin_id"), ("vs_currencies", "usd")],
        )
        .await
        .unwrap()
        .ensure_ok();

    assert!(matches!(result, Err(RequestError::Status { code: 400 })));
}

#[tokio::test]
async fn simple_price_rejects_an_unknown_currency() {
    let client = client().await;

    let result = client
        .get(
            endpoints::SIMPLE_PRICE,
            &[("ids", "bitcoin"), ("vs_currencies", "invalid_currency")],
        )
        .await
        .unwrap()
        .ensure_ok();

    assert!(matches!(result, Err(RequestError::Status { code: 400 })));
}

#[tokio::test]
async fn coins_markets_rows_carry_market_fields() {
    let client = client().await;
    let retrier = Retrier::default();

    let probe = retrier
        .run(|| async {
            client
                .get(
                    endpoints::COINS_MARKETS,
                    &[("vs_currency", "usd"), ("ids", "bitcoin")],
                )
                .await?
                .ensure_ok()
        })
        .await
        .unwrap();

    let body = probe.json().unwrap();
    let rows = body.as_array().unwrap();
    assert!(!rows.is_empty());
    assert!(rows[0]["current_price"].is_number());
    assert!(rows[0]["market_cap"].is_number());
}

#[tokio::test]
async fn coins_markets_rejects_an_unknown_currency() {
    let client = client().await;

    let result = client
        .get(endpoints::COINS_MARKETS, &[("vs_currency", "invalid_currency")])
        .await
        .unwrap()
        .ensure_ok();

    assert!(matches!(result, Err(RequestError::Status { code: 400 })));
}

#[tokio::test]
async fn coins_list_is_nonempty_with_identity_fields() {
    let client = client().await;
    let retrier = Retrier::default();

    let probe = retrier
        .run(|| async { client.get(endpoints::COINS_LIST, &[]).await?.ensure_ok() })
        .await
        .unwrap();

    let body = probe.json().unwrap();
    let rows = body.as_array().unwrap();
    assert!(!rows.is_empty());
    assert!(rows[0]["id"].is_string());
    assert!(rows[0]["symbol"].is_string());
    assert!(rows[0]["name"].is_string());
}

#[tokio::test]
async fn ping_answers_with_json() {
    let client = client().await;

    let probe = client.get(endpoints::PING, &[]).await.unwrap();

    assert_eq!(probe.status, 200);
    assert!(probe.content_type.as_deref().unwrap().contains("application/json"));
    assert!(probe.rate_limit_remaining.is_some());
}
