use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// Spawn one mock exchange per test binary and install the tracing
/// subscriber. Each test file picks its own port so the binaries can run in
/// parallel.
#[allow(unused)]
pub async fn init(port: u16, quota_per_minute: u32) {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    let wait = ONCE_LOCK.get().is_none();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
            std::process::exit(1);
        }));

        FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_env_filter("priceprobe=debug,mock_exchange=debug,axum::rejection=trace")
            .init();

        // Run the mock on a dedicated thread with its own runtime so it
        // outlives the per-test `#[tokio::test]` runtime that first spawns it.
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
                mock_exchange::run(addr, quota_per_minute).await;
            });
        });
    });

    if wait {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

#[allow(unused)]
pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}
