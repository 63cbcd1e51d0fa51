//! # Pagination Driver
//!
//! One implementation of the collection policy shared by every source:
//! walk result pages, honour the site's declared totals, dedup by URL,
//! stop on the first terminating condition, then sample.
//!
//! Sources differ only in their `ListingStrategy` (page URL convention, card
//! selectors, page phrasing) and their `PageLoader` (HTTP or render).

use std::collections::HashSet;
use std::sync::Arc;

use scraper::Html;
use tracing::{debug, info, warn};

use super::page_loader::{OnLoadFailure, PageLoader};
use crate::domain::{Listing, PaginationLimits, PaginationState, Site, StopReason, page_url};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::parsing::{
    ContextualParser, ListingCardParser, PageCards, PageSignal, PageSignals, ParseContext, ParsingResult,
    SiteParsingConfig, visible_text,
};

/// Site-specific pieces of a pagination run
pub struct ListingStrategy {
    site: Site,
    page_param: String,
    parser: ListingCardParser,
    signals: PageSignals,
}

/// What one loaded page contributes
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub signal: PageSignal,
    pub cards: PageCards,
}

impl ListingStrategy {
    pub fn from_config(site: Site, config: &SiteParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            site,
            page_param: config.page_param.clone(),
            parser: ListingCardParser::new(site, config)?,
            signals: PageSignals::from_config(config)?,
        })
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn page_url(&self, search_url: &str, page: u32) -> String {
        page_url(search_url, page, &self.page_param)
    }

    /// Parse a page body into its signal and cards; the DOM does not outlive this call
    pub fn analyse(&self, body: &str, page: u32, url: &str) -> ParsingResult<PageAnalysis> {
        let html = Html::parse_document(body);
        let context = ParseContext::new(self.site, page, url)?;
        let signal = self.signals.read(&visible_text(&html));
        let cards = self.parser.parse_with_context(&html, &context)?;
        Ok(PageAnalysis { signal, cards })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    pub limits: PaginationLimits,
    /// Fixed sampling seed; entropy-seeded per call when `None`
    pub seed: Option<u64>,
}

impl DriverSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            limits: PaginationLimits {
                max_pages: config.pagination.max_pages,
                max_stale_pages: config.pagination.max_stale_pages,
            },
            seed: config.sampling.seed,
        }
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Result of walking the pages of one search, before sampling
#[derive(Debug, Clone)]
pub struct Collection {
    pub pool: Vec<Listing>,
    pub stop: StopReason,
    pub pages_loaded: u32,
    pub declared_total: Option<usize>,
}

pub struct PaginationDriver {
    strategy: ListingStrategy,
    loader: Arc<dyn PageLoader>,
    settings: DriverSettings,
}

impl PaginationDriver {
    pub fn new(strategy: ListingStrategy, loader: Arc<dyn PageLoader>, settings: DriverSettings) -> Self {
        Self {
            strategy,
            loader,
            settings,
        }
    }

    pub fn site(&self) -> Site {
        self.strategy.site()
    }

    /// Collect across pages, then keep at most `limit` listings chosen uniformly
    pub async fn fetch_listings(&self, search_url: &str, limit: usize) -> Vec<Listing> {
        let site = self.site();
        let collection = self.collect(search_url).await;

        info!(
            "[{}] Collected {} unique listings over {} page(s) (stop: {})",
            site,
            collection.pool.len(),
            collection.pages_loaded,
            collection.stop
        );

        let pool_size = collection.pool.len();
        let mut rng = match self.settings.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let sampled = sample_uniform(collection.pool, limit, &mut rng);
        if sampled.len() < pool_size {
            info!("[{}] Randomly selected {} of {} listings", site, sampled.len(), pool_size);
        }
        sampled
    }

    /// Walk result pages until a terminating condition; all state is local to the call
    pub async fn collect(&self, search_url: &str) -> Collection {
        let site = self.site();
        let mut state = PaginationState::new(self.settings.limits);
        let mut seen: HashSet<String> = HashSet::new();
        let mut pool: Vec<Listing> = Vec::new();
        let mut pages_loaded = 0;

        let finish = |pool: Vec<Listing>, stop: StopReason, pages_loaded: u32, state: &PaginationState| Collection {
            pool,
            stop,
            pages_loaded,
            declared_total: state.authoritative_total(),
        };

        loop {
            let page = state.current_page();
            let url = self.strategy.page_url(search_url, page);

            let body = match self.loader.load(&url).await {
                Ok(body) => body,
                Err(e) if e.is_empty_page() && !state.is_first_page() => {
                    debug!("[{}] Page {} shows no listings; probably the last page", site, page);
                    return finish(pool, StopReason::NoCandidates, pages_loaded, &state);
                }
                Err(e) => {
                    warn!("⚠️ [{}] Page {} could not be loaded: {}", site, page, e);
                    return match self.loader.on_failure() {
                        OnLoadFailure::KeepCollected => finish(pool, StopReason::LoadFailed, pages_loaded, &state),
                        OnLoadFailure::DiscardAll => finish(Vec::new(), StopReason::LoadFailed, pages_loaded, &state),
                    };
                }
            };
            pages_loaded += 1;

            let analysis = match self.strategy.analyse(&body, page, &url) {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("⚠️ [{}] Page {} could not be parsed: {}", site, page, e);
                    return finish(pool, StopReason::LoadFailed, pages_loaded, &state);
                }
            };

            if state.is_first_page() {
                match analysis.signal {
                    PageSignal::NoResults => {
                        info!("[{}] Site reports no results for {}", site, search_url);
                        return finish(Vec::new(), StopReason::NoResults, pages_loaded, &state);
                    }
                    PageSignal::Total(total) => {
                        info!("[{}] Site reports {} listings for this search", site, total);
                        state.set_authoritative_total(total);
                    }
                    PageSignal::Unknown => {
                        warn!(
                            "[{}] Total listing count not found on {}; stopping on {} unchanged pages instead",
                            site, url, self.settings.limits.max_stale_pages
                        );
                    }
                }
            } else if analysis.signal == PageSignal::NoResults {
                // Past the last real page some sites fall back to a "no results" notice
                debug!("[{}] Page {} reports no results", site, page);
                return finish(pool, StopReason::NoResults, pages_loaded, &state);
            }

            if analysis.cards.candidates == 0 {
                debug!("[{}] No listing cards on page {}; probably the last page", site, page);
                return finish(pool, StopReason::NoCandidates, pages_loaded, &state);
            }

            let mut new_items = 0;
            for listing in analysis.cards.listings {
                if state.total_reached(pool.len()) {
                    break;
                }
                if seen.insert(listing.url.clone()) {
                    pool.push(listing);
                    new_items += 1;
                }
            }

            info!(
                "[{}] Page {}: {} new listings, {} collected so far",
                site,
                page,
                new_items,
                pool.len()
            );

            if state.total_reached(pool.len()) {
                return finish(pool, StopReason::TotalReached, pages_loaded, &state);
            }
            if let Some(stop) = state.finish_page(new_items) {
                return finish(pool, stop, pages_loaded, &state);
            }
        }
    }
}

/// Keep `limit` items chosen uniformly at random (partial Fisher-Yates);
/// a pool no larger than `limit` is returned unchanged
pub fn sample_uniform<T>(mut pool: Vec<T>, limit: usize, rng: &mut fastrand::Rng) -> Vec<T> {
    if pool.len() <= limit {
        return pool;
    }
    for i in 0..limit {
        let j = rng.usize(i..pool.len());
        pool.swap(i, j);
    }
    pool.truncate(limit);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawling::page_loader::PageLoadError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://www.emlakjet.com/satilik-konut/adana-seyhan";

    /// Serves canned pages by URL and records every request
    struct MapLoader {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
        on_failure: OnLoadFailure,
    }

    impl MapLoader {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                requested: Mutex::new(Vec::new()),
                on_failure: OnLoadFailure::KeepCollected,
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageLoader for MapLoader {
        async fn load(&self, url: &str) -> Result<String, PageLoadError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| PageLoadError::Status {
                url: url.to_string(),
                status: 404,
            })
        }

        fn on_failure(&self) -> OnLoadFailure {
            self.on_failure
        }
    }

    fn page_n(n: u32) -> String {
        page_url(BASE, n, "sayfa")
    }

    fn cards(ids: std::ops::Range<u32>, header: &str) -> String {
        let anchors: String = ids
            .map(|i| format!("<a href=\"/ilan/{i}\">Daire {i} {}.000 TL</a>", 100 + i))
            .collect();
        format!("<html><body><h1>{header}</h1>{anchors}</body></html>")
    }

    fn driver(loader: Arc<MapLoader>) -> PaginationDriver {
        let strategy = ListingStrategy::from_config(Site::Emlakjet, &SiteParsingConfig::emlakjet()).unwrap();
        let settings = DriverSettings {
            limits: PaginationLimits {
                max_pages: 50,
                max_stale_pages: 3,
            },
            seed: Some(7),
        };
        PaginationDriver::new(strategy, loader, settings)
    }

    #[tokio::test]
    async fn test_no_results_page_returns_empty_despite_cards() {
        let loader = Arc::new(MapLoader::new(vec![(
            page_n(1),
            cards(0..5, "Aramanıza uygun ilan bulunamadı. Benzer ilanlar"),
        )]));
        let collection = driver(loader.clone()).collect(BASE).await;

        assert!(collection.pool.is_empty());
        assert_eq!(collection.stop, StopReason::NoResults);
        assert_eq!(loader.requested(), vec![page_n(1)]);
    }

    #[tokio::test]
    async fn test_zero_total_never_scans_page_two() {
        let loader = Arc::new(MapLoader::new(vec![
            (page_n(1), cards(0..5, "0 adet ilan")),
            (page_n(2), cards(5..10, "")),
        ]));
        let collection = driver(loader.clone()).collect(BASE).await;

        assert!(collection.pool.is_empty());
        assert_eq!(loader.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_total_is_a_hard_ceiling() {
        let loader = Arc::new(MapLoader::new(vec![
            (page_n(1), cards(0..4, "6 adet ilan")),
            (page_n(2), cards(4..8, "6 adet ilan")),
            (page_n(3), cards(8..12, "6 adet ilan")),
        ]));
        let collection = driver(loader.clone()).collect(BASE).await;

        assert_eq!(collection.pool.len(), 6);
        assert_eq!(collection.stop, StopReason::TotalReached);
        assert_eq!(collection.declared_total, Some(6));
        assert_eq!(loader.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_pages_stop_without_total() {
        // Every page repeats the same cards; the site never states a total
        let pages = (1..=10).map(|n| (page_n(n), cards(0..3, "Satılık daireler"))).collect();
        let loader = Arc::new(MapLoader::new(pages));
        let collection = driver(loader.clone()).collect(BASE).await;

        assert_eq!(collection.pool.len(), 3);
        assert_eq!(collection.stop, StopReason::StaleStreak);
        // page 1 adds, pages 2-4 add nothing
        assert_eq!(loader.requested().len(), 4);
    }

    #[tokio::test]
    async fn test_stops_on_page_without_cards() {
        let loader = Arc::new(MapLoader::new(vec![
            (page_n(1), cards(0..3, "")),
            (page_n(2), cards(3..5, "")),
            (page_n(3), "<html><body><p>Son</p></body></html>".to_string()),
        ]));
        let collection = driver(loader).collect(BASE).await;

        assert_eq!(collection.pool.len(), 5);
        assert_eq!(collection.stop, StopReason::NoCandidates);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_collected_items() {
        let loader = Arc::new(MapLoader::new(vec![(page_n(1), cards(0..3, ""))]));
        let collection = driver(loader).collect(BASE).await;

        assert_eq!(collection.pool.len(), 3);
        assert_eq!(collection.stop, StopReason::LoadFailed);
    }

    #[tokio::test]
    async fn test_load_failure_discards_for_rendered_sources() {
        let mut loader = MapLoader::new(vec![(page_n(1), cards(0..3, ""))]);
        loader.on_failure = OnLoadFailure::DiscardAll;
        let collection = driver(Arc::new(loader)).collect(BASE).await;

        assert!(collection.pool.is_empty());
    }

    #[tokio::test]
    async fn test_dedup_by_normalized_url() {
        let body = "<html><body>\
            <a href=\"/ilan/1\">A 100 TL</a>\
            <a href=\"https://www.emlakjet.com/ilan/1#foto\">A 100 TL</a>\
            <a href=\"/ilan/2\">B 200 TL</a></body></html>";
        let loader = Arc::new(MapLoader::new(vec![(page_n(1), body.to_string())]));
        let collection = driver(loader).collect(BASE).await;

        let urls: Vec<_> = collection.pool.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://www.emlakjet.com/ilan/1", "https://www.emlakjet.com/ilan/2"]
        );
    }

    #[tokio::test]
    async fn test_fetch_listings_samples_down_to_limit() {
        let loader = Arc::new(MapLoader::new(vec![(page_n(1), cards(0..20, "20 adet ilan"))]));
        let listings = driver(loader).fetch_listings(BASE, 5).await;

        assert_eq!(listings.len(), 5);
        let unique: HashSet<_> = listings.iter().map(|l| &l.url).collect();
        assert_eq!(unique.len(), 5);
        assert!(listings.iter().all(|l| l.price > 0));
    }

    proptest! {
        #[test]
        fn prop_sample_is_pool_when_limit_covers_it(len in 0usize..40, extra in 0usize..10, seed: u64) {
            let pool: Vec<usize> = (0..len).collect();
            let mut rng = fastrand::Rng::with_seed(seed);
            prop_assert_eq!(sample_uniform(pool.clone(), len + extra, &mut rng), pool);
        }

        #[test]
        fn prop_sample_has_limit_distinct_pool_items(len in 1usize..60, seed: u64, pick in 0usize..60) {
            let limit = pick % len;
            let pool: Vec<usize> = (0..len).collect();
            let mut rng = fastrand::Rng::with_seed(seed);
            let sample = sample_uniform(pool, limit, &mut rng);

            prop_assert_eq!(sample.len(), limit);
            let distinct: HashSet<_> = sample.iter().collect();
            prop_assert_eq!(distinct.len(), limit);
            prop_assert!(sample.iter().all(|x| *x < len));
        }
    }
}
