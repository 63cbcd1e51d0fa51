//! Anomalies command - per-city outlier tables from a summary CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::application::AnomalyDetector;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv_store;

/// Arguments for the anomalies command
#[derive(Args, Debug)]
pub struct AnomaliesArgs {
    /// Summary CSV with at least `city` and `avg_price` columns
    #[arg(long, short)]
    pub input: PathBuf,

    /// Only analyse this site's rows; an empty value analyses all rows
    #[arg(long, short)]
    pub site: Option<String>,

    /// Directory for the three result tables (defaults to `output.anomaly_directory`)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

pub fn execute(args: AnomaliesArgs, config: &AppConfig) -> Result<()> {
    let rows = csv_store::read_summaries(&args.input)
        .with_context(|| format!("Failed to read summaries from {:?}", args.input))?;

    let mut detector = AnomalyDetector::from_settings(&config.anomaly);
    if let Some(site) = args.site {
        detector = detector.with_site(site);
    }

    let report = detector.detect(&rows);
    if report.rows.is_empty() {
        warn!("No analysable rows in {:?} (site filter: {:?})", args.input, detector.site());
        return Ok(());
    }

    let directory = args.output_dir.unwrap_or_else(|| config.output.anomaly_directory.clone());
    report.write_to(&directory)?;

    for count in &report.counts {
        info!("{:>9}: {}", count.flag, count.count);
    }
    Ok(())
}
