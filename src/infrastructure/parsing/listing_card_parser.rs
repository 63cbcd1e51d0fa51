//! Listing card parser
//!
//! Robust extraction of listing cards from a result page with selector
//! fallbacks. A broken card is skipped; it never aborts the page.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::SiteParsingConfig;
use super::text::element_text;
use super::{ContextualParser, ParseContext, ParsingError, ParsingResult};
use crate::domain::{Listing, Site};

lazy_static! {
    /// Currency-tagged amount, e.g. "8.750.000 TL" or "1,250,000₺"
    static ref PRICE_TOKEN: Regex =
        Regex::new(r"([\d][\d\.,]*)\s*(?:TL|₺)").expect("price token pattern compiles");

    /// Trailing kuruş part, currency suffix included ("2.500.000,50", "2.500.000,50 TL")
    static ref DECIMAL_TAIL: Regex =
        Regex::new(r",\d{1,2}\s*(?:TL|₺)?\s*$").expect("decimal pattern compiles");
}

const UNTITLED: &str = "Başlık yok";

/// Cards found on one page
#[derive(Debug, Clone, Default)]
pub struct PageCards {
    /// Elements matched by the card selector, usable or not
    pub candidates: usize,
    /// Cards with a link and a positive price, in page order
    pub listings: Vec<Listing>,
}

/// Parse a bare amount ("2.500.000", "1,250,000", "2.500.000,50") into whole TL
pub fn parse_amount(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let integral = DECIMAL_TAIL.replace(raw, "");
    let digits: String = integral.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(amount) => Some(amount),
    }
}

/// Price and title out of a card's text: the price is the last
/// currency-tagged number, the title is everything before it
pub fn decode_price(text: &str) -> Option<(u64, String)> {
    let token = PRICE_TOKEN.captures_iter(text).last()?;
    let whole = token.get(0)?;
    let amount = parse_amount(token.get(1)?.as_str())?;
    let title = text[..whole.start()].trim().to_string();
    Some((amount, title))
}

/// Parser for the cards of one site
pub struct ListingCardParser {
    site: Site,
    card_selectors: Vec<Selector>,
    link_selector: Option<Selector>,
    price_selector: Option<Selector>,
}

impl ListingCardParser {
    pub fn new(site: Site, config: &SiteParsingConfig) -> ParsingResult<Self> {
        let card_selectors = Self::compile_selectors(&config.card_selectors)?;
        let link_selector = config
            .link_selector
            .as_deref()
            .map(Self::compile)
            .transpose()?;
        let price_selector = config
            .price_selector
            .as_deref()
            .map(Self::compile)
            .transpose()?;

        Ok(Self {
            site,
            card_selectors,
            link_selector,
            price_selector,
        })
    }

    fn compile(selector: &str) -> ParsingResult<Selector> {
        Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
    }

    /// Compile fallbacks; invalid ones are logged, but at least one must compile
    fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for selector_str in selector_strings {
            match Selector::parse(selector_str) {
                Ok(selector) => selectors.push(selector),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", selector_str, e);
                    errors.push(format!("'{selector_str}': {e}"));
                }
            }
        }

        if selectors.is_empty() {
            return Err(ParsingError::ConfigurationError {
                message: format!("No valid card selectors compiled. Errors: {}", errors.join(", ")),
            });
        }

        Ok(selectors)
    }

    pub fn site(&self) -> Site {
        self.site
    }

    fn extract_card(&self, card: &ElementRef, context: &ParseContext) -> ParsingResult<Listing> {
        let link = match &self.link_selector {
            Some(selector) => card
                .select(selector)
                .next()
                .ok_or(ParsingError::MissingLink { page: context.page })?,
            None => *card,
        };

        let href = link
            .value()
            .attr("href")
            .filter(|h| !h.trim().is_empty())
            .ok_or(ParsingError::MissingLink { page: context.page })?;
        let url = context.normalize_url(href)?;

        let (price, title) = match &self.price_selector {
            Some(selector) => {
                let price_text = card
                    .select(selector)
                    .next()
                    .map(|el| element_text(&el))
                    .unwrap_or_default();
                let price = parse_amount(&price_text).ok_or(ParsingError::MissingPrice {
                    page: context.page,
                    text: price_text,
                })?;
                (price, element_text(&link))
            }
            None => {
                let text = element_text(card);
                decode_price(&text).ok_or(ParsingError::MissingPrice {
                    page: context.page,
                    text,
                })?
            }
        };

        let title = if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };

        Ok(Listing {
            title,
            price,
            url,
            site: self.site,
        })
    }
}

impl ContextualParser for ListingCardParser {
    type Output = PageCards;
    type Context = ParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<PageCards> {
        let mut page = PageCards::default();

        // First selector with any match wins
        let Some(elements) = self
            .card_selectors
            .iter()
            .map(|selector| html.select(selector).collect::<Vec<_>>())
            .find(|elements| !elements.is_empty())
        else {
            debug!("No listing cards on {} page {}", self.site, context.page);
            return Ok(page);
        };

        page.candidates = elements.len();

        for (index, element) in elements.iter().enumerate() {
            match self.extract_card(element, context) {
                Ok(listing) => page.listings.push(listing),
                Err(e @ ParsingError::MissingPrice { .. }) => {
                    debug!("Dropping card {} on {} page {}: {}", index, self.site, context.page, e);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping card {} on {} page {}: {}", index, self.site, context.page, e);
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            "{} page {}: {} candidates, {} priced cards",
            self.site,
            context.page,
            page.candidates,
            page.listings.len()
        );

        Ok(page)
    }
}
