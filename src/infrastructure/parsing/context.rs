//! Parsing context for listing pages

use url::Url;

use super::{ParsingError, ParsingResult};
use crate::domain::Site;

/// Context information for parsing one result page
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub site: Site,

    /// 1-based page number within the current pagination run
    pub page: u32,

    /// URL the page was loaded from; relative links resolve against it
    pub page_url: Url,
}

impl ParseContext {
    pub fn new(site: Site, page: u32, page_url: &str) -> ParsingResult<Self> {
        let page_url = Url::parse(page_url).map_err(|e| ParsingError::UrlResolutionFailed {
            url: page_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { site, page, page_url })
    }

    /// Absolute URL of `href` with the fragment stripped; the dedup key
    pub fn normalize_url(&self, href: &str) -> ParsingResult<String> {
        let mut url = self
            .page_url
            .join(href.trim())
            .map_err(|e| ParsingError::UrlResolutionFailed {
                url: href.to_string(),
                reason: e.to_string(),
            })?;
        url.set_fragment(None);
        Ok(url.to_string())
    }
}
