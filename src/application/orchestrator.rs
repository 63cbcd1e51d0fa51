//! Acquisition orchestrator
//!
//! For one location: ask every configured source for listings, isolate
//! per-source failures, and turn the results into detail rows plus one
//! summary row per source that produced data.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::crawling::{SourceAdapter, build_enabled_adapters};
use crate::domain::{DetailRow, Listing, Location, Site, SummaryRow, average_price, round2};
use crate::infrastructure::config::{AppConfig, site_urls};

/// Everything one location produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationReport {
    pub details: Vec<DetailRow>,
    pub summaries: Vec<SummaryRow>,
}

impl LocationReport {
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }
}

pub struct AcquisitionOrchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    concurrent: bool,
}

impl AcquisitionOrchestrator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, concurrent: bool) -> Self {
        Self { adapters, concurrent }
    }

    /// Orchestrator over `sources.enabled` with production clients
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(build_enabled_adapters(config)?, config.sweep.concurrent_sources))
    }

    pub fn sites(&self) -> Vec<Site> {
        self.adapters.iter().map(|a| a.site()).collect()
    }

    /// Query every source for `location`; results keep source-configuration order
    pub async fn run_for_location(&self, location: &Location, limit: usize) -> LocationReport {
        info!("=== {}: up to {} listings per source ===", location, limit);

        let jobs: Vec<(Site, String)> = self
            .adapters
            .iter()
            .map(|adapter| {
                let url = site_urls::search_url(adapter.site(), location);
                info!("- {}: {}", adapter.site(), url);
                (adapter.site(), url)
            })
            .collect();

        let results = self.fetch_all(&jobs, limit).await;

        let mut report = LocationReport::default();
        let mut all_listings: Vec<Listing> = Vec::new();

        for ((site, _), listings) in jobs.iter().zip(results) {
            let Some(listings) = listings else {
                continue;
            };
            if listings.is_empty() {
                warn!("{}: no listings found (check selectors or URL)", site);
                continue;
            }

            let site_avg = round2(average_price(&listings));
            info!("{}: {} listings, average price = {:.0} TL", site, listings.len(), site_avg);

            report.summaries.push(SummaryRow {
                city: location.city.clone(),
                district: location.district.clone(),
                site: *site,
                num_listings: listings.len(),
                avg_price: site_avg,
            });
            report
                .details
                .extend(listings.iter().map(|l| DetailRow::from_listing(location, l)));
            all_listings.extend(listings);
        }

        if all_listings.is_empty() {
            warn!("No listings collected from any source for {}", location);
            return report;
        }

        info!(
            "{}: overall average of {} listings = {:.0} TL",
            location,
            all_listings.len(),
            average_price(&all_listings)
        );
        report
    }

    /// One task per source so a panicking adapter only loses its own result.
    /// `None` marks a source whose task failed.
    async fn fetch_all(&self, jobs: &[(Site, String)], limit: usize) -> Vec<Option<Vec<Listing>>> {
        let spawn = move |adapter: &Arc<dyn SourceAdapter>, url: &str| {
            let adapter = Arc::clone(adapter);
            let url = url.to_string();
            tokio::spawn(async move { adapter.fetch_listings(&url, limit).await })
        };

        let joined = if self.concurrent {
            let handles: Vec<_> = self
                .adapters
                .iter()
                .zip(jobs)
                .map(|(adapter, (_, url))| spawn(adapter, url))
                .collect();
            join_all(handles).await
        } else {
            let mut joined = Vec::with_capacity(jobs.len());
            for (adapter, (_, url)) in self.adapters.iter().zip(jobs) {
                joined.push(spawn(adapter, url).await);
            }
            joined
        };

        joined
            .into_iter()
            .zip(jobs)
            .map(|(result, (site, _))| match result {
                Ok(listings) => Some(listings),
                Err(e) => {
                    error!("❌ {} source failed: {}", site, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedAdapter {
        site: Site,
        prices: Vec<u64>,
        delay: Duration,
    }

    #[async_trait]
    impl SourceAdapter for FixedAdapter {
        fn site(&self) -> Site {
            self.site
        }

        async fn fetch_listings(&self, search_url: &str, limit: usize) -> Vec<Listing> {
            tokio::time::sleep(self.delay).await;
            self.prices
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, price)| Listing {
                    title: format!("İlan {i}"),
                    price: *price,
                    url: format!("{search_url}/ilan/{i}"),
                    site: self.site,
                })
                .collect()
        }
    }

    struct PanickingAdapter;

    #[async_trait]
    impl SourceAdapter for PanickingAdapter {
        fn site(&self) -> Site {
            Site::Hepsiemlak
        }

        async fn fetch_listings(&self, _search_url: &str, _limit: usize) -> Vec<Listing> {
            panic!("selector blew up");
        }
    }

    fn fixed(site: Site, prices: &[u64], delay_ms: u64) -> Arc<dyn SourceAdapter> {
        Arc::new(FixedAdapter {
            site,
            prices: prices.to_vec(),
            delay: Duration::from_millis(delay_ms),
        })
    }

    #[tokio::test]
    async fn test_two_sources_summaries_in_config_order() {
        // The first source finishes last; output still follows configuration order
        let orchestrator = AcquisitionOrchestrator::new(
            vec![
                fixed(Site::Emlakjet, &[100, 200, 300], 30),
                fixed(Site::Tapu, &[150, 250, 999_999], 0),
            ],
            true,
        );
        let report = orchestrator
            .run_for_location(&Location::new("Adana", "Cukurova"), 10)
            .await;

        assert_eq!(report.details.len(), 6);
        assert_eq!(report.summaries.len(), 2);

        let emlakjet = &report.summaries[0];
        assert_eq!(emlakjet.site, Site::Emlakjet);
        assert_eq!(emlakjet.num_listings, 3);
        assert_eq!(emlakjet.avg_price, 200.0);

        let tapu = &report.summaries[1];
        assert_eq!(tapu.site, Site::Tapu);
        assert_eq!(tapu.num_listings, 3);
        assert_eq!(tapu.avg_price, 333_466.33);
        assert_eq!(tapu.city, "Adana");
        assert_eq!(tapu.district, "Cukurova");
    }

    #[tokio::test]
    async fn test_failing_source_does_not_suppress_others() {
        for concurrent in [true, false] {
            let orchestrator = AcquisitionOrchestrator::new(
                vec![Arc::new(PanickingAdapter), fixed(Site::Tapu, &[150, 250], 0)],
                concurrent,
            );
            let report = orchestrator
                .run_for_location(&Location::new("Adana", "Seyhan"), 10)
                .await;

            assert_eq!(report.summaries.len(), 1);
            assert_eq!(report.summaries[0].site, Site::Tapu);
            assert_eq!(report.details.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_zero_prices_kept_in_details_but_not_in_mean() {
        let orchestrator =
            AcquisitionOrchestrator::new(vec![fixed(Site::Emlakjet, &[0, 100, 300], 0)], false);
        let report = orchestrator
            .run_for_location(&Location::new("Adana", "Seyhan"), 10)
            .await;

        assert_eq!(report.details.len(), 3);
        assert_eq!(report.summaries[0].num_listings, 3);
        assert_eq!(report.summaries[0].avg_price, 200.0);
    }

    #[tokio::test]
    async fn test_no_data_is_an_empty_report() {
        let orchestrator = AcquisitionOrchestrator::new(
            vec![fixed(Site::Emlakjet, &[], 0), fixed(Site::Tapu, &[], 0)],
            true,
        );
        let report = orchestrator
            .run_for_location(&Location::new("Adana", "Seyhan"), 10)
            .await;

        assert!(report.is_empty());
        assert!(report.summaries.is_empty());
    }
}
