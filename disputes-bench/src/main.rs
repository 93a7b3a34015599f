use anyhow::Context;
use clap::Parser;
use disputes_bench::bench::{self, install_prometheus};
use disputes_bench::prelude::*;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("disputes_bench=info")),
        )
        .init();

    let config = Config::from_args(BenchArgs::parse()).context("Invalid configuration")?;

    // NOTE: The exporter has to be in place before any series is registered.
    if let Some(addr) = config.metrics_addr {
        install_prometheus(addr).context("Unable to start the metrics endpoint")?;
    }

    let registry = Registry::new();
    let client = HttpTransport::new(&config, &registry).context("Unable to build HTTP client")?;

    info!(
        "Targeting {} with {} VUs per scenario for {}",
        config.events_url(),
        config.vus,
        humantime::format_duration(config.duration),
    );

    let summary = bench::run(Arc::new(config), Arc::new(client), &registry).await;

    println!("\n{summary}");

    Ok(())
}
