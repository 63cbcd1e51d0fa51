//! hepsiemlak.com: result list is built client-side, so pages go through the
//! render service. `?page=N` pagination; cards are `li.listing-item`
//! (older layout: `article.listingView`) with a `a.card-link` title link and
//! a `span.list-view-price` price.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::crawling::adapter::SourceAdapter;
use crate::crawling::page_loader::RenderPageLoader;
use crate::crawling::pagination_driver::{DriverSettings, ListingStrategy, PaginationDriver};
use crate::domain::{Listing, Site};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::page_renderer::{PageRenderer, RenderServiceClient};

const DEFAULT_WAIT_SELECTOR: &str = "li.listing-item, article.listingView";

pub struct HepsiemlakAdapter {
    driver: PaginationDriver,
}

impl HepsiemlakAdapter {
    /// Adapter backed by the configured render service, inert without one
    pub fn new(config: &AppConfig) -> Result<Self> {
        let renderer = RenderServiceClient::from_settings(&config.render)?
            .map(|client| Arc::new(client) as Arc<dyn PageRenderer>);
        if renderer.is_none() {
            warn!("[hepsiemlak] No render endpoint configured (render.endpoint); source will return no data");
        }
        Self::with_renderer(renderer, config)
    }

    pub fn with_renderer(renderer: Option<Arc<dyn PageRenderer>>, config: &AppConfig) -> Result<Self> {
        let parsing = &config.sources.hepsiemlak;
        let strategy = ListingStrategy::from_config(Site::Hepsiemlak, parsing)
            .context("Invalid hepsiemlak parsing configuration")?;
        let wait_for = parsing.render_wait_selector.as_deref().unwrap_or(DEFAULT_WAIT_SELECTOR);
        let loader = RenderPageLoader::new(
            renderer,
            wait_for,
            Duration::from_secs(config.render.wait_timeout_seconds),
        );
        Ok(Self {
            driver: PaginationDriver::new(strategy, Arc::new(loader), DriverSettings::from_config(config)),
        })
    }
}

#[async_trait]
impl SourceAdapter for HepsiemlakAdapter {
    fn site(&self) -> Site {
        Site::Hepsiemlak
    }

    async fn fetch_listings(&self, search_url: &str, limit: usize) -> Vec<Listing> {
        info!("[hepsiemlak] Rendering listings: {}", search_url);
        self.driver.fetch_listings(search_url, limit).await
    }
}
