//! # Listing Sources
//!
//! One adapter per site. All of them run the shared pagination driver; they
//! differ in selectors, page phrasing and how a page is loaded.

pub mod emlakjet;
pub mod hepsiemlak;
pub mod tapu;

pub use emlakjet::EmlakjetAdapter;
pub use hepsiemlak::HepsiemlakAdapter;
pub use tapu::TapuAdapter;

use std::sync::Arc;

use anyhow::Result;

use super::adapter::SourceAdapter;
use crate::domain::Site;
use crate::infrastructure::config::AppConfig;

/// Build the adapter for one site with production clients
pub fn build_adapter(site: Site, config: &AppConfig) -> Result<Arc<dyn SourceAdapter>> {
    Ok(match site {
        Site::Emlakjet => Arc::new(EmlakjetAdapter::new(config)?),
        Site::Tapu => Arc::new(TapuAdapter::new(config)?),
        Site::Hepsiemlak => Arc::new(HepsiemlakAdapter::new(config)?),
    })
}

/// Adapters for `sources.enabled`, in configuration order
pub fn build_enabled_adapters(config: &AppConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    config
        .sources
        .enabled
        .iter()
        .map(|site| build_adapter(*site, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::page_renderer::{PageRenderer, RenderError};
    use crate::infrastructure::simple_http_client::{FetchError, FetchedPage, PageFetcher};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct MapFetcher(HashMap<String, FetchedPage>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            Ok(self.0.get(url).cloned().unwrap_or(FetchedPage {
                status: 404,
                body: String::new(),
            }))
        }
    }

    /// Canned render results; unknown pages never show the awaited cards
    struct MapRenderer(HashMap<String, Result<String, RenderError>>);

    impl MapRenderer {
        fn pages(pages: Vec<(&str, Result<String, RenderError>)>) -> Arc<dyn PageRenderer> {
            Arc::new(Self(pages.into_iter().map(|(url, page)| (url.to_string(), page)).collect()))
        }
    }

    #[async_trait]
    impl PageRenderer for MapRenderer {
        async fn render(&self, url: &str, _wait_for: &str, timeout: Duration) -> Result<String, RenderError> {
            self.0.get(url).cloned().unwrap_or_else(|| {
                Err(RenderError::Timeout {
                    url: url.to_string(),
                    seconds: timeout.as_secs(),
                })
            })
        }
    }

    const HEPSIEMLAK: &str = "https://www.hepsiemlak.com/seyhan-satilik";

    const HEPSIEMLAK_PAGE: &str = r#"<html><body><ul>
        <li class="listing-item"><a class="card-link" href="/ilan/1">Daire</a>
          <span class="list-view-price">2.000.000</span></li>
        <li class="listing-item"><a class="card-link" href="/ilan/2">Villa</a>
          <span class="list-view-price">5.500.000</span></li>
        <li class="listing-item"><a class="card-link" href="/ilan/3">Arsa</a>
          <span class="list-view-price">Fiyat sorunuz</span></li>
        </ul></body></html>"#;

    fn ok(body: &str) -> FetchedPage {
        FetchedPage {
            status: 200,
            body: body.to_string(),
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.retry.delay_ms = 0;
        config.sampling.seed = Some(42);
        config
    }

    #[tokio::test]
    async fn test_tapu_adapter_reads_asset_cards() {
        let base = "https://www.tapu.com/konut/adana-seyhan";
        let page1 = r#"<html><body><p>Toplam 3 ilan</p>
            <a class="asset" href="/ilan/a">Bahçeli ev 2.100.000 TL</a>
            <a class="asset" href="/ilan/b">Daire 1.400.000 TL</a>
            <a class="asset" href="/ilan/c">Arsa fiyat sorunuz</a>
            </body></html>"#;
        let page2 = r#"<html><body><a class="asset" href="/ilan/d">Dükkan 900.000 TL</a></body></html>"#;
        let fetcher = MapFetcher(HashMap::from([
            (base.to_string(), ok(page1)),
            (format!("{base}?sayfa=2"), ok(page2)),
        ]));

        let adapter = TapuAdapter::with_fetcher(Arc::new(fetcher), &test_config()).unwrap();
        let listings = adapter.fetch_listings(base, 10).await;

        assert_eq!(adapter.site(), Site::Tapu);
        assert_eq!(listings.len(), 3);
        assert!(listings.iter().all(|l| l.site == Site::Tapu && l.price > 0));
        assert_eq!(listings[0].url, "https://www.tapu.com/ilan/a");
        assert_eq!(listings[2].title, "Dükkan");
    }

    #[tokio::test]
    async fn test_emlakjet_adapter_stops_on_error_status() {
        let base = "https://www.emlakjet.com/satilik-konut/adana-seyhan";
        let page1 = r#"<html><body><a href="/ilan/1">Daire 1.000.000 TL</a></body></html>"#;
        let fetcher = MapFetcher(HashMap::from([(base.to_string(), ok(page1))]));

        let adapter = EmlakjetAdapter::with_fetcher(Arc::new(fetcher), &test_config()).unwrap();
        let listings = adapter.fetch_listings(base, 10).await;

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, 1_000_000);
    }

    #[tokio::test]
    async fn test_hepsiemlak_stops_when_next_page_shows_no_cards() {
        // no declared total; page 2 never shows listing cards
        let renderer = MapRenderer::pages(vec![(HEPSIEMLAK, Ok(HEPSIEMLAK_PAGE.to_string()))]);

        let adapter = HepsiemlakAdapter::with_renderer(Some(renderer), &test_config()).unwrap();
        let listings = adapter.fetch_listings(HEPSIEMLAK, 10).await;

        assert_eq!(listings.len(), 2);
        assert!(listings.iter().all(|l| l.price > 0));
    }

    #[tokio::test]
    async fn test_hepsiemlak_render_service_failure_returns_empty() {
        let page2 = format!("{HEPSIEMLAK}?page=2");
        let renderer = MapRenderer::pages(vec![
            (HEPSIEMLAK, Ok(HEPSIEMLAK_PAGE.to_string())),
            (
                page2.as_str(),
                Err(RenderError::Service {
                    url: page2.clone(),
                    reason: "connection refused".to_string(),
                }),
            ),
        ]);

        let adapter = HepsiemlakAdapter::with_renderer(Some(renderer), &test_config()).unwrap();
        assert!(adapter.fetch_listings(HEPSIEMLAK, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_hepsiemlak_first_page_timeout_returns_empty() {
        let renderer = MapRenderer::pages(Vec::new());
        let adapter = HepsiemlakAdapter::with_renderer(Some(renderer), &test_config()).unwrap();
        assert!(adapter.fetch_listings(HEPSIEMLAK, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_hepsiemlak_rendered_pages() {
        let page1 = r#"<html><body><p>Seyhan satılık için 2 ilan</p><ul>
            <li class="listing-item"><a class="card-link" href="/ilan/1">Daire</a>
              <span class="list-view-price">2.000.000</span></li>
            <li class="listing-item"><a class="card-link" href="/ilan/2">Villa</a>
              <span class="list-view-price">5.500.000</span></li>
            </ul></body></html>"#;
        let renderer = MapRenderer::pages(vec![(HEPSIEMLAK, Ok(page1.to_string()))]);

        let adapter = HepsiemlakAdapter::with_renderer(Some(renderer), &test_config()).unwrap();
        let listings = adapter.fetch_listings(HEPSIEMLAK, 10).await;

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].title, "Villa");
        assert_eq!(listings[1].price, 5_500_000);
    }

    #[tokio::test]
    async fn test_hepsiemlak_without_renderer_is_inert() {
        let adapter = HepsiemlakAdapter::with_renderer(None, &test_config()).unwrap();
        assert!(
            adapter
                .fetch_listings("https://www.hepsiemlak.com/seyhan-satilik", 10)
                .await
                .is_empty()
        );
    }

    #[test]
    fn test_enabled_adapters_follow_config_order() {
        let mut config = test_config();
        config.sources.enabled = vec![Site::Tapu, Site::Emlakjet];
        let adapters = build_enabled_adapters(&config).unwrap();
        let sites: Vec<_> = adapters.iter().map(|a| a.site()).collect();
        assert_eq!(sites, vec![Site::Tapu, Site::Emlakjet]);
    }
}
