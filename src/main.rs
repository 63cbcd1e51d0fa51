//! emlak-sweep command line
//!
//! - `survey`: one location, interactive when arguments are missing
//! - `sweep`: every location of a CSV
//! - `anomalies`: per-city outlier tables from a summary CSV
//! - `filter-site`: keep one site's rows of a CSV

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use emlak_sweep::cli::{self, Cli, Commands};
use emlak_sweep::infrastructure::{AppConfig, init_logging_with_config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    info!("🚀 emlak-sweep v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Survey(args) => cli::survey::execute(args, &config).await?,
        Commands::Sweep(args) => cli::sweep::execute(args, &config).await?,
        Commands::Anomalies(args) => cli::anomalies::execute(args, &config)?,
        Commands::FilterSite(args) => cli::filter_site::execute(args)?,
    }

    Ok(())
}
