//! Parsing configuration for listing pages
//!
//! Centralized per-site CSS selectors, page parameter and page-text phrasing.

use serde::{Deserialize, Serialize};

/// Page-count phrasing shared by the sites; the first matching pattern wins.
/// Each pattern captures the number in group 1.
const COMMON_TOTAL_PATTERNS: &[&str] = &[
    r"(?i)([\d][\d\.,]*)\s+ilan\s+bulundu",
    r"(?i)toplam\s+([\d][\d\.,]*)\s+ilan",
    r"(?i)([\d][\d\.,]*)\s+sonuç",
    r"(?i)([\d][\d\.,]*)\s+listings?\s+found",
    r"(?i)total\s+([\d][\d\.,]*)\s+listings?",
    r"(?i)([\d][\d\.,]*)\s+results?\b",
];

/// Phrases a site shows when the exact query has no matches (often followed
/// by unrelated "similar" listings)
const COMMON_NO_RESULT_PHRASES: &[&str] = &[
    "aramanıza uygun ilan bulunamadı",
    "aradığınız kriterlere uygun ilan bulunamadı",
    "sonuç bulunamadı",
    "ilan bulunamadı",
    "no results found",
    "no listings found",
];

/// Selectors and phrasing for one listing site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteParsingConfig {
    /// Query parameter carrying the page number (page 1 has none)
    pub page_param: String,

    /// Card container selectors - multiple fallbacks, first non-empty wins
    pub card_selectors: Vec<String>,

    /// Link inside the card; `None` when the card itself is the anchor
    #[serde(default)]
    pub link_selector: Option<String>,

    /// Dedicated price element inside the card; `None` reads the card text
    #[serde(default)]
    pub price_selector: Option<String>,

    /// Regexes reading the declared total from the page text
    pub total_patterns: Vec<String>,

    /// Case-insensitive literal phrases meaning "zero matches"
    pub no_result_phrases: Vec<String>,

    /// Element set a rendered page must show before it is captured
    #[serde(default)]
    pub render_wait_selector: Option<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl SiteParsingConfig {
    pub fn emlakjet() -> Self {
        let mut total_patterns = vec![r"(?i)([\d][\d\.,]*)\s+adet\s+ilan\b".to_string()];
        total_patterns.extend(strings(COMMON_TOTAL_PATTERNS));

        Self {
            page_param: "sayfa".to_string(),
            card_selectors: strings(&["a[href*='/ilan/']"]),
            link_selector: None,
            price_selector: None,
            total_patterns,
            no_result_phrases: strings(COMMON_NO_RESULT_PHRASES),
            render_wait_selector: None,
        }
    }

    pub fn tapu() -> Self {
        Self {
            page_param: "sayfa".to_string(),
            card_selectors: strings(&["a.asset"]),
            link_selector: None,
            price_selector: None,
            total_patterns: strings(COMMON_TOTAL_PATTERNS),
            no_result_phrases: strings(COMMON_NO_RESULT_PHRASES),
            render_wait_selector: None,
        }
    }

    pub fn hepsiemlak() -> Self {
        let mut total_patterns = vec![r"(?i)için\s+([\d][\d\.,]*)\s+ilan".to_string()];
        total_patterns.extend(strings(COMMON_TOTAL_PATTERNS));

        Self {
            page_param: "page".to_string(),
            card_selectors: strings(&["li.listing-item", "article.listingView"]),
            link_selector: Some("a.card-link".to_string()),
            price_selector: Some("span.list-view-price".to_string()),
            total_patterns,
            no_result_phrases: strings(COMMON_NO_RESULT_PHRASES),
            render_wait_selector: Some("li.listing-item, article.listingView".to_string()),
        }
    }
}
