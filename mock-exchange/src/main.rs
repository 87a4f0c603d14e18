use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Default budget mirrors the live API's demo tier.
const QUOTA_PER_MINUTE: u32 = 30;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr: SocketAddr = "0.0.0.0:3000".parse().unwrap();
    tracing::info!("mock exchange listening on {addr}");
    mock_exchange::run(addr, QUOTA_PER_MINUTE).await;
}
