//! CLI entry point for the PM2.5 rater.
//!
//! Provides subcommands for the monthly station statistics, the daily
//! comparison between national stations and the reference monitor, or both.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pm25_rater::config::AppConfig;
use pm25_rater::logging::init_logging;
use pm25_rater::pipeline::{run_comparison, run_monthly};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "pm25_rater")]
#[command(about = "Analyze hourly PM2.5 records of five Chinese cities", long_about = None)]
struct Cli {
    /// JSON configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly per-station means and hourly pollution shares per city
    Monthly,
    /// Daily national vs. US-post means and severity day counts
    Compare,
    /// Run both pipelines
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let _log_guard = init_logging()?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            AppConfig::load(path)?
        }
        None => {
            let config = AppConfig::default();
            config.validate()?;
            config
        }
    };
    let config = Arc::new(config);

    match cli.command {
        Commands::Monthly => {
            let report = run_monthly(config).await?;
            info!(files = report.files.len(), "Monthly statistics complete");
        }
        Commands::Compare => {
            let report = run_comparison(config).await?;
            info!(days = report.daily.len(), "Daily comparison complete");
        }
        Commands::All => {
            let monthly = run_monthly(config.clone()).await?;
            let comparison = run_comparison(config).await?;
            info!(
                files = monthly.files.len() + comparison.files.len(),
                "All pipelines complete"
            );
        }
    }

    Ok(())
}
