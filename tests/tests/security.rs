//! Security-posture tests: hostile inputs and auth failures must be
//! rejected cleanly — 403s with an error body, never a 500.

mod utils;
#[allow(unused)]
use utils::*;

use priceprobe::prelude::*;

const PORT: u16 = 3102;
const QUOTA: u32 = 6_000;

const SQL_INJECTION_PAYLOADS: &[&str] = &[
    "' OR '1'='1",
    "; DROP TABLE coins --",
    "' UNION SELECT * FROM coins --",
    "1' OR '1'='1",
    "1; SELECT * FROM coins WHERE id LIKE '%",
    "bitcoin' OR '1'='1",
];

async fn client() -> ApiClient {
    init(PORT, QUOTA).await;
    ApiClient::new(&base_url(PORT), mock_exchange::DEMO_API_KEY, None).unwrap()
}

#[tokio::test]
async fn sql_injection_payloads_are_rejected_without_a_server_error() {
    let client = client().await;

    for payload in SQL_INJECTION_PAYLOADS {
        let probe = client
            .get(
                endpoints::COINS_MARKETS,
                &[("vs_currency", "usd"), ("ids", payload)],
            )
            .await
            .unwrap();

        assert_ne!(probe.status, 500, "payload {payload:?} caused a server error");
        assert_eq!(probe.status, 403, "payload {payload:?} was not rejected");
    }
}

#[tokio::test]
async fn special_characters_never_cause_a_server_error() {
    let client = client().await;

    for ch in ["\"", "'", ";", "--", "/*", "*/", "=", "+", ",", "\\"] {
        let ids = format!("bitcoin{ch}");
        let probe = client
            .get(
                endpoints::COINS_MARKETS,
                &[("vs_currency", "usd"), ("ids", &ids)],
            )
            .await
            .unwrap();

        assert_ne!(probe.status, 500, "ids {ids:?} caused a server error");
    }
}

#[tokio::test]
async fn requests_without_an_api_key_are_rejected() {
    init(PORT, QUOTA).await;
    let anonymous = ApiClient::new(&base_url(PORT), "", None).unwrap();

    let probe = anonymous
        .get(endpoints::COINS_MARKETS, &[("vs_currency", "usd"), ("ids", "bitcoin")])
        .await
        .unwrap();

    assert_eq!(probe.status, 403);
    assert!(probe.json().unwrap().get("error").is_some());
}

#[tokio::test]
async fn invalid_api_keys_are_rejected() {
    init(PORT, QUOTA).await;
    let intruder = ApiClient::new(&base_url(PORT), "invalid_key_here", None).unwrap();

    let probe = intruder
        .get(endpoints::COINS_MARKETS, &[("vs_currency", "usd"), ("ids", "bitcoin")])
        .await
        .unwrap();

    assert_eq!(probe.status, 403);
    assert!(probe.json().unwrap().get("error").is_some());
}

#[tokio::test]
async fn api_key_in_query_parameters_is_not_accepted() {
    init(PORT, QUOTA).await;
    let anonymous = ApiClient::new(&base_url(PORT), "", None).unwrap();

    let probe = anonymous
        .get(
            endpoints::COINS_MARKETS,
            &[
                ("vs_currency", "usd"),
                ("ids", "bitcoin"),
                ("api_key", mock_exchange::DEMO_API_KEY),
            ],
        )
        .await
        .unwrap();

    assert_eq!(probe.status, 403);
}

#[test]
fn live_configuration_defaults_to_https() {
    // With no PRICEPROBE_* variables set, the baked-in live endpoint applies.
    let config = RunConfig::from_env().unwrap();
    assert!(config.base_url.starts_with("https://"));
}
