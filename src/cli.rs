//! Command-line interface
//!
//! Argument definitions and one `execute` per subcommand.

pub mod anomalies;
pub mod filter_site;
pub mod survey;
pub mod sweep;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Real-estate listing price survey
#[derive(Parser, Debug)]
#[command(name = "emlak-sweep")]
#[command(about = "Survey listing prices per district and flag per-city outliers")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to emlak-sweep.toml lookup)
    #[arg(long, global = true, env = "EMLAK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Survey one location across all enabled sources
    Survey(survey::SurveyArgs),
    /// Survey every location listed in a CSV
    Sweep(sweep::SweepArgs),
    /// Flag per-city price outliers in a summary CSV
    Anomalies(anomalies::AnomaliesArgs),
    /// Copy only one site's rows of a CSV
    FilterSite(filter_site::FilterSiteArgs),
}
