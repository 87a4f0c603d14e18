//! Load-driver tests: short staged ramps against the mock exchange, with
//! and without headroom in the per-minute budget.

mod utils;
#[allow(unused)]
use utils::*;

use priceprobe::prelude::*;
use priceprobe::report;
use std::net::SocketAddr;
use std::time::Duration;

const PORT: u16 = 3103;
const QUOTA: u32 = 6_000;

fn short_stages() -> Vec<Stage> {
    vec![
        Stage::new(Duration::from_millis(500), 2),
        Stage::new(Duration::from_millis(1_500), 2),
    ]
}

async fn spawn_constrained_mock(port: u16, quota_per_minute: u32) {
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    tokio::spawn(async move { mock_exchange::run(addr, quota_per_minute).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn staged_run_with_headroom_collects_clean_outcomes() {
    init(PORT, QUOTA).await;
    let client = ApiClient::new(&base_url(PORT), mock_exchange::DEMO_API_KEY, None).unwrap();

    let work = move || {
        let client = client.clone();
        async move { client.get(endpoints::PING, &[]).await }
    };

    let result = LoadTest::new("ping_load", work)
        .stages(short_stages())
        .iteration_sleep(Duration::from_millis(100))
        .await;

    assert!(result.total > 0);
    assert_eq!(result.failures, 0);
    assert!((result.success_rate - 1.0).abs() < f64::EPSILON);
    assert!(result.rate_limit_min.is_some());
    assert!(mock_exchange::requests_served() >= result.total);

    let rendered = report::render_default(&result);
    assert!(rendered.contains("Response Time Distribution"));
    assert!(rendered.contains("Total Iterations:"));
    assert_eq!(rendered, report::render_default(&result));
}

#[tokio::test]
async fn exhausted_budget_shows_up_as_rate_limit_failures() {
    init(PORT, QUOTA).await;
    spawn_constrained_mock(3104, 3).await;
    let client = ApiClient::new(&base_url(3104), mock_exchange::DEMO_API_KEY, None).unwrap();

    let work = move || {
        let client = client.clone();
        async move { client.get(endpoints::PING, &[]).await }
    };

    let result = LoadTest::new("ping_overload", work)
        .stages(short_stages())
        .iteration_sleep(Duration::from_millis(100))
        .await;

    // The burst passes, everything after it is refused until the window
    // refills, which takes longer than this run.
    assert!(result.successes >= 1);
    assert!(result.failures > 0);
    assert_eq!(result.rate_limit_min, Some(0));
    assert!(result
        .outcomes
        .iter()
        .any(|o| !o.success && o.status == Some(429)));
}

#[tokio::test]
async fn exhausted_retries_surface_the_final_429() {
    init(PORT, QUOTA).await;
    spawn_constrained_mock(3105, 1).await;
    let client = ApiClient::new(&base_url(3105), mock_exchange::DEMO_API_KEY, None).unwrap();

    // Drain the single-token budget, then watch the retrier exhaust.
    client.get(endpoints::PING, &[]).await.unwrap();

    let retrier = Retrier::new(3, Duration::from_millis(100));
    let result = retrier
        .run(|| async { client.get(endpoints::PING, &[]).await?.ensure_ok() })
        .await;

    match result {
        Err(RequestError::RateLimited { remaining }) => assert_eq!(remaining, Some(0)),
        other => panic!("expected exhausted rate-limit retries, got {other:?}"),
    }
}

#[test]
fn captured_outcomes_round_trip_through_json() {
    use std::time::SystemTime;

    let outcomes: Vec<RequestOutcome> = (0..10)
        .map(|i| RequestOutcome {
            timestamp: SystemTime::UNIX_EPOCH,
            duration: Duration::from_millis(100 + i * 10),
            status: Some(200),
            success: true,
            rate_limit_remaining: (i % 2 == 0).then_some(25),
        })
        .collect();

    let json = serde_json::to_string_pretty(&outcomes).unwrap();
    let restored: Vec<RequestOutcome> = serde_json::from_str(&json).unwrap();

    let original = RunResult::from_outcomes(outcomes);
    let roundtrip = RunResult::from_outcomes(restored);
    assert_eq!(original.total, roundtrip.total);
    assert_eq!(original.duration_p95, roundtrip.duration_p95);
    assert_eq!(original.rate_limit_avg, roundtrip.rate_limit_avg);
    assert_eq!(
        report::render_default(&original),
        report::render_default(&roundtrip)
    );
}
