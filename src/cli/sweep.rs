//! Sweep command - every location of a CSV, one after another

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use super::survey::effective_limit;
use crate::application::{AcquisitionOrchestrator, LocationSweep};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv_store;

/// Arguments for the sweep command
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// CSV with an `il,ilce` (or `city,district`) header
    #[arg(long)]
    pub locations: PathBuf,

    /// Summary CSV to write (defaults to `output.sweep_summary_file`)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Listings per source (defaults to `sweep.per_source_limit`)
    #[arg(long, short)]
    pub limit: Option<usize>,
}

pub async fn execute(args: SweepArgs, config: &AppConfig) -> Result<()> {
    let locations = csv_store::read_locations(&args.locations)
        .with_context(|| format!("Failed to read locations from {:?}", args.locations))?;
    if locations.is_empty() {
        warn!("{:?} lists no locations", args.locations);
        return Ok(());
    }

    let limit = effective_limit(args.limit.unwrap_or(config.sweep.per_source_limit));
    let orchestrator = AcquisitionOrchestrator::from_config(config)?;
    let outcome = LocationSweep::new(&orchestrator, config.sweep.location_delay())
        .run(&locations, limit)
        .await;

    if !outcome.has_data() {
        warn!("No data collected for any of {} locations", outcome.processed);
        return Ok(());
    }

    let output = args.output.unwrap_or_else(|| config.output.sweep_summary_file.clone());
    csv_store::write_summaries(&output, &outcome.summaries)?;
    info!("📁 {} summary rows written to {:?}", outcome.summaries.len(), output);
    Ok(())
}
