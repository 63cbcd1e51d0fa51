//! tapu.com: server-rendered result pages, `?sayfa=N` pagination,
//! one `a.asset` anchor per listing

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

pub struct TapuAdapter {
    driver: PaginationDriver,
}

impl TapuAdapter {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = HttpClient::with_config(HttpClientConfig::from_settings(&config.http))?
            .with_context_label(Site::Tapu.as_str());
        Self::with_fetcher(Arc::new(client), config)
    }

    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, config: &AppConfig) -> Result<Self> {
        let strategy = ListingStrategy::from_config(Site::Tapu, &config.sources.tapu)
            .context("Invalid tapu parsing configuration")?;
        let loader = HttpPageLoader::new(fetcher, RetryPolicy::from_settings(&config.retry));
        Ok(Self {
            driver: PaginationDriver::new(strategy, Arc::new(loader), DriverSettings::from_config(config)),
        })
    }
}

#[async_trait]
impl SourceAdapter for TapuAdapter {
    fn site(&self) -> Site {
        Site::Tapu
    }

    async fn fetch_listings(&self, search_url: &str, limit: usize) -> Vec<Listing> {
        info!("[tapu] Fetching listings: {}", search_url);
        self.driver.fetch_listings(search_url, limit).await
    }
}
