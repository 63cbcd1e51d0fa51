//! Survey command - one location, all enabled sources

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use tracing::{info, warn};

use crate::application::AcquisitionOrchestrator;
use crate::domain::Location;
use crate::infrastructure::config::{AppConfig, defaults};
use crate::infrastructure::csv_store;

/// Arguments for the survey command
#[derive(Args, Debug)]
pub struct SurveyArgs {
    /// City (il), prompted when missing
    #[arg(long)]
    pub city: Option<String>,

    /// District (ilçe), prompted when missing
    #[arg(long)]
    pub district: Option<String>,

    /// Listings per source, prompted when missing
    #[arg(long, short)]
    pub limit: Option<usize>,
}

/// A zero limit means the default
pub fn effective_limit(limit: usize) -> usize {
    if limit == 0 { defaults::PER_SOURCE_LIMIT } else { limit }
}

/// Parse a typed limit; anything but a positive integer means the default
pub fn parse_limit(answer: &str) -> usize {
    answer.trim().parse::<usize>().map_or(defaults::PER_SOURCE_LIMIT, effective_limit)
}

fn prompt_text(prompt: &str) -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("Failed to read '{prompt}'"))
}

fn prompt_limit() -> Result<usize> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Listings per source")
        .default(defaults::PER_SOURCE_LIMIT.to_string())
        .interact_text()
        .context("Failed to read the listing limit")?;
    Ok(parse_limit(&answer))
}

pub async fn execute(args: SurveyArgs, config: &AppConfig) -> Result<()> {
    let city = match args.city {
        Some(city) => city,
        None => prompt_text("City (il)")?,
    };
    let district = match args.district {
        Some(district) => district,
        None => prompt_text("District (ilçe)")?,
    };
    let limit = match args.limit {
        Some(limit) => effective_limit(limit),
        None => prompt_limit()?,
    };

    let location = Location::new(city, district);
    let orchestrator = AcquisitionOrchestrator::from_config(config)?;
    let report = orchestrator.run_for_location(&location, limit).await;

    if report.is_empty() {
        warn!("No data collected for {}", location);
        return Ok(());
    }

    let detail_file = csv_store::write_details(&config.output.directory, &location, &report.details)?;
    csv_store::append_summaries(&config.output.summary_file, &report.summaries)?;

    for row in &report.summaries {
        info!("{}: {} listings, average {:.0} TL", row.site, row.num_listings, row.avg_price);
    }
    info!("📁 Details: {:?}", detail_file);
    info!("📁 Summary appended to {:?}", config.output.summary_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("25", 25)]
    #[case(" 3 ", 3)]
    #[case("", 10)]
    #[case("on", 10)]
    #[case("0", 10)]
    #[case("-4", 10)]
    fn test_limit_answer_falls_back_to_ten(#[case] answer: &str, #[case] expected: usize) {
        assert_eq!(parse_limit(answer), expected);
    }

    #[rstest]
    #[case(0, 10)]
    #[case(1, 1)]
    #[case(40, 40)]
    fn test_limit_flag_follows_prompt_rule(#[case] flag: usize, #[case] expected: usize) {
        assert_eq!(effective_limit(flag), expected);
        assert_eq!(effective_limit(flag), parse_limit(&flag.to_string()));
    }
}
