//! Harness entrypoint: run a live staged load test from environment
//! configuration, or render the report for a previously captured outcome
//! sequence. No state persists between runs beyond the files written here.

use anyhow::Context;
use clap::{Parser, Subcommand};
use priceprobe::prelude::*;
use priceprobe::report;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "priceprobe", about = "Load and correctness probe for a rate-limited price API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the staged load test against the configured live API.
    Run {
        /// Also write the raw outcome sequence as JSON.
        #[arg(long)]
        capture: Option<PathBuf>,
        /// Also write the rendered report.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render the report for a captured outcome sequence.
    Report {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Command::Run { capture, output } => run(capture, output).await,
        Command::Report { input, output } => render_captured(&input, output),
    }
}

async fn run(capture: Option<PathBuf>, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = RunConfig::from_env().context("loading PRICEPROBE_* environment")?;
    let client = ApiClient::from_config(&config).context("building API client")?;
    let retrier = Retrier::new(config.max_retries, config.retry_delay);

    let work = move || {
        let client = client.clone();
        async move {
            retrier
                .run(|| async {
                    client
                        .get(
                            endpoints::COINS_MARKETS,
                            &[
                                ("vs_currency", "usd"),
                                ("order", "market_cap_desc"),
                                ("per_page", "5"),
                                ("page", "1"),
                                ("sparkline", "false"),
                            ],
                        )
                        .await?
                        .ensure_ok()
                })
                .await
        }
    };

    let result = LoadTest::new("coins_markets", work)
        .stages(config.stages.clone())
        .iteration_sleep(config.iteration_sleep)
        .checks(SuccessPolicy::api_default(config.latency_threshold))
        .await;

    if let Some(path) = capture {
        let json = serde_json::to_string_pretty(&result.outcomes)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("captured {} outcomes to {}", result.total, path.display());
    }

    emit(&report::render_default(&result), output)
}

fn render_captured(input: &PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let json = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let outcomes: Vec<RequestOutcome> =
        serde_json::from_str(&json).context("parsing captured outcomes")?;

    let result = RunResult::from_outcomes(outcomes);
    emit(&report::render_default(&result), output)
}

fn emit(rendered: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{rendered}");
    if let Some(path) = output {
        fs::write(&path, rendered).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("report saved to {}", path.display());
    }
    Ok(())
}
