//! Parsing error types for listing pages
//!
//! Card-level errors are recoverable: the card is skipped and the page goes on.
//! Configuration errors (bad selectors or patterns) are not.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid text pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Listing card on page {page} has no link")]
    MissingLink { page: u32 },

    #[error("Listing card on page {page} has no usable price: {text}")]
    MissingPrice { page: u32, text: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error only affects a single card
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::MissingLink { .. } => true,
            Self::MissingPrice { .. } => true,
            Self::UrlResolutionFailed { .. } => true,
            Self::InvalidSelector { .. } => false,
            Self::InvalidPattern { .. } => false,
            Self::ConfigurationError { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
