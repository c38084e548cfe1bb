//! Bike Dashboard - renders the bike-sharing rental report
//!
//! Reads the daily and hourly CSV files, applies the date range and writes
//! the charts, table dump and HTML page into the output directory.

use anyhow::{Context, Result};
use bike_dashboard::DashboardConfig;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry().with(stderr_layer).init();

    let config = DashboardConfig::parse();
    info!(
        day = %config.day_csv.display(),
        hour = %config.hour_csv.display(),
        output = %config.output_dir.display(),
        "starting dashboard"
    );

    let files = bike_dashboard::run(&config).context("failed to build dashboard")?;
    info!(page = %files.page.display(), charts = files.charts.len(), "dashboard ready");

    if config.open {
        if let Err(e) = open::that(&files.page) {
            error!(error = %e, page = %files.page.display(), "could not open page");
        }
    }

    Ok(())
}
