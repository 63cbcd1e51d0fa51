//! Location sweep driver
//!
//! Runs the orchestrator over a list of locations one at a time, pausing
//! between locations so the sites are not hammered, and concatenates the
//! summary rows of every location that produced data.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::orchestrator::{AcquisitionOrchestrator, LocationReport};
use crate::domain::{Location, SummaryRow};

/// Anything that can survey one location; the orchestrator in production
#[async_trait]
pub trait LocationSurvey: Send + Sync {
    async fn survey(&self, location: &Location, limit: usize) -> anyhow::Result<LocationReport>;
}

#[async_trait]
impl LocationSurvey for AcquisitionOrchestrator {
    async fn survey(&self, location: &Location, limit: usize) -> anyhow::Result<LocationReport> {
        Ok(self.run_for_location(location, limit).await)
    }
}

/// A location that contributed nothing, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLocation {
    pub location: Location,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOutcome {
    /// Summary rows of all productive locations, in input order
    pub summaries: Vec<SummaryRow>,
    pub skipped: Vec<SkippedLocation>,
    pub processed: usize,
}

impl SweepOutcome {
    pub fn has_data(&self) -> bool {
        !self.summaries.is_empty()
    }
}

pub struct LocationSweep<'a, S: LocationSurvey + ?Sized> {
    survey: &'a S,
    delay: Duration,
}

impl<'a, S: LocationSurvey + ?Sized> LocationSweep<'a, S> {
    pub fn new(survey: &'a S, delay: Duration) -> Self {
        Self { survey, delay }
    }

    pub async fn run(&self, locations: &[Location], limit: usize) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let total = locations.len();

        for (index, location) in locations.iter().enumerate() {
            info!("=== {}/{}: {} ===", index + 1, total, location);
            outcome.processed += 1;

            match self.survey.survey(location, limit).await {
                Ok(report) if !report.summaries.is_empty() => {
                    outcome.summaries.extend(report.summaries);
                }
                Ok(_) => {
                    warn!("No summary data for {}, skipping", location);
                    outcome.skipped.push(SkippedLocation {
                        location: location.clone(),
                        reason: "no summary data".to_string(),
                    });
                }
                Err(e) => {
                    warn!("Survey of {} failed: {:#}", location, e);
                    outcome.skipped.push(SkippedLocation {
                        location: location.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            if index + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Sweep finished: {} locations, {} summary rows, {} skipped",
            outcome.processed,
            outcome.summaries.len(),
            outcome.skipped.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Site;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Scripted per-city results; records call order
    struct FakeSurvey {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LocationSurvey for FakeSurvey {
        async fn survey(&self, location: &Location, _limit: usize) -> anyhow::Result<LocationReport> {
            self.calls.lock().unwrap().push(location.district.clone());
            match location.district.as_str() {
                "Hata" => anyhow::bail!("network down"),
                "Bos" => Ok(LocationReport::default()),
                district => Ok(LocationReport {
                    details: Vec::new(),
                    summaries: vec![SummaryRow {
                        city: location.city.clone(),
                        district: district.to_string(),
                        site: Site::Emlakjet,
                        num_listings: 1,
                        avg_price: 100.0,
                    }],
                }),
            }
        }
    }

    fn locations(districts: &[&str]) -> Vec<Location> {
        districts.iter().map(|d| Location::new("Adana", *d)).collect()
    }

    #[tokio::test]
    async fn test_skips_failed_and_empty_locations() {
        let survey = FakeSurvey {
            calls: Mutex::new(Vec::new()),
        };
        let sweep = LocationSweep::new(&survey, Duration::ZERO);
        let outcome = sweep.run(&locations(&["Seyhan", "Hata", "Bos", "Ceyhan"]), 10).await;

        assert_eq!(outcome.processed, 4);
        let districts: Vec<_> = outcome.summaries.iter().map(|s| s.district.as_str()).collect();
        assert_eq!(districts, vec!["Seyhan", "Ceyhan"]);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].location.district, "Hata");
        assert_eq!(*survey.calls.lock().unwrap(), vec!["Seyhan", "Hata", "Bos", "Ceyhan"]);
    }

    #[tokio::test]
    async fn test_no_data_at_all() {
        let survey = FakeSurvey {
            calls: Mutex::new(Vec::new()),
        };
        let outcome = LocationSweep::new(&survey, Duration::ZERO)
            .run(&locations(&["Bos", "Hata"]), 10)
            .await;
        assert!(!outcome.has_data());
    }

    #[tokio::test]
    async fn test_delay_only_between_locations() {
        let survey = FakeSurvey {
            calls: Mutex::new(Vec::new()),
        };
        let sweep = LocationSweep::new(&survey, Duration::from_millis(40));

        let started = Instant::now();
        sweep.run(&locations(&["Seyhan"]), 10).await;
        assert!(started.elapsed() < Duration::from_millis(40));

        let started = Instant::now();
        sweep.run(&locations(&["Seyhan", "Ceyhan", "Yuregir"]), 10).await;
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
