//! Filter-site command - keep one site's rows

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::infrastructure::csv_store;

/// Arguments for the filter-site command
#[derive(Args, Debug)]
pub struct FilterSiteArgs {
    /// CSV with a `site` column
    #[arg(long, short)]
    pub input: PathBuf,

    /// Site name to keep, e.g. `emlakjet`
    #[arg(long, short)]
    pub site: String,

    #[arg(long, short)]
    pub output: PathBuf,
}

pub fn execute(args: FilterSiteArgs) -> Result<()> {
    csv_store::filter_site(&args.input, &args.site, &args.output)
        .with_context(|| format!("Failed to filter {:?}", args.input))?;
    Ok(())
}
