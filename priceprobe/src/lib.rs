//! Black-box test harness core for a rate-limited cryptocurrency price API.
//!
//! Three cooperating pieces, leaves first:
//!
//! - [`client::ApiClient`] + [`retry::Retrier`] — a thin GET client with
//!   bounded retry-on-429 semantics.
//! - [`load_test::LoadTest`] — a staged virtual-user load driver. Each user
//!   loops work/classify/record/sleep while the user count follows a linear
//!   ramp schedule.
//! - [`priceprobe_core::RunResult`] + [`report`] — end-of-run aggregation
//!   and a fixed text report with an ASCII response-time chart.
//!
//! ```no_run
//! use priceprobe::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ApiClient::new("http://127.0.0.1:3000", "demo-key", None).unwrap();
//!     let work = move || {
//!         let client = client.clone();
//!         async move { client.get(endpoints::PING, &[]).await }
//!     };
//!
//!     let result = LoadTest::new("ping", work)
//!         .stage(Duration::from_secs(60), 3)
//!         .stage(Duration::from_secs(120), 3)
//!         .await;
//!
//!     println!("{}", priceprobe::report::render_default(&result));
//! }
//! ```

pub mod checks;
pub mod client;
pub mod report;
pub mod retry;

pub(crate) mod runner;

pub use priceprobe_core as core;

pub mod prelude {
    pub use crate::checks::{Check, SuccessPolicy};
    pub use crate::client::{ApiClient, Probe, RequestError};
    pub use crate::load_test::LoadTest;
    pub use crate::retry::Retrier;
    pub use priceprobe_core::{endpoints, RequestOutcome, RunConfig, RunResult, Stage};
}
