//! emlakjet.com: server-rendered result pages, `?sayfa=N` pagination,
//! listing anchors under `/ilan/`, declared totals as "N adet ilan"

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::crawling::adapter::SourceAdapter;
use crate::crawling::page_loader::HttpPageLoader;
use crate::crawling::pagination_driver::{DriverSettings, ListingStrategy, PaginationDriver};
use crate::domain::{Listing, Site};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::retry_manager::RetryPolicy;
use crate::infrastructure::simple_http_client::{HttpClient, HttpClientConfig, PageFetcher};

pub struct EmlakjetAdapter {
    driver: PaginationDriver,
}

impl EmlakjetAdapter {
    /// Adapter with its own rate-limited HTTP client
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = HttpClient::with_config(HttpClientConfig::from_settings(&config.http))?
            .with_context_label(Site::Emlakjet.as_str());
        Self::with_fetcher(Arc::new(client), config)
    }

    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, config: &AppConfig) -> Result<Self> {
        let strategy = ListingStrategy::from_config(Site::Emlakjet, &config.sources.emlakjet)
            .context("Invalid emlakjet parsing configuration")?;
        let loader = HttpPageLoader::new(fetcher, RetryPolicy::from_settings(&config.retry));
        Ok(Self {
            driver: PaginationDriver::new(strategy, Arc::new(loader), DriverSettings::from_config(config)),
        })
    }
}

#[async_trait]
impl SourceAdapter for EmlakjetAdapter {
    fn site(&self) -> Site {
        Site::Emlakjet
    }

    async fn fetch_listings(&self, search_url: &str, limit: usize) -> Vec<Listing> {
        info!("[emlakjet] Fetching listings: {}", search_url);
        self.driver.fetch_listings(search_url, limit).await
    }
}
