//! HTML parsing for listing result pages
//!
//! Trait-based parsing with per-site selector configuration, card-level error
//! recovery and page-text signals (declared totals, "no results" notices).

pub mod config;
pub mod context;
pub mod error;
pub mod listing_card_parser;
pub mod page_signals;
pub mod text;

// Re-export public types
pub use config::SiteParsingConfig;
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult};
pub use listing_card_parser::{ListingCardParser, PageCards, decode_price, parse_amount};
pub use page_signals::{PageSignal, PageSignals};
pub use text::{element_text, visible_text};

use scraper::Html;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
