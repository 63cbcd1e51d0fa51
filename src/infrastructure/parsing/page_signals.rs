//! Result-count signals read from a listing page's visible text
//!
//! Sites declare how many listings match a query ("1.234 adet ilan") and, when
//! nothing matches, say so before padding the page with unrelated "similar"
//! listings. Both signals are phrasing-dependent, so they live behind named
//! predicates that can be tested on their own.

use regex::Regex;
use tracing::debug;

use super::config::SiteParsingConfig;
use super::{ParsingError, ParsingResult};

/// What the first page says about the query's result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    /// The site states there are no matches; cards on the page are not data
    NoResults,
    /// The site states the number of matches
    Total(usize),
    /// No recognizable phrasing
    Unknown,
}

#[derive(Debug, Clone)]
pub struct PageSignals {
    total_patterns: Vec<Regex>,
    no_result_patterns: Vec<Regex>,
}

impl PageSignals {
    pub fn new(total_patterns: &[String], no_result_phrases: &[String]) -> ParsingResult<Self> {
        let total_patterns = total_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ParsingError::invalid_pattern(p, e)))
            .collect::<ParsingResult<Vec<_>>>()?;

        let no_result_patterns = no_result_phrases
            .iter()
            .map(|phrase| {
                let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
                let pattern = format!(r"(?i){}", words.join(r"\s+"));
                Regex::new(&pattern).map_err(|e| ParsingError::invalid_pattern(phrase, e))
            })
            .collect::<ParsingResult<Vec<_>>>()?;

        Ok(Self {
            total_patterns,
            no_result_patterns,
        })
    }

    pub fn from_config(config: &SiteParsingConfig) -> ParsingResult<Self> {
        Self::new(&config.total_patterns, &config.no_result_phrases)
    }

    /// True when the text declares that the exact query has zero matches
    pub fn is_authoritative_zero(&self, text: &str) -> bool {
        self.no_result_patterns.iter().any(|re| re.is_match(text))
    }

    /// Declared total from the first pattern that matches with a number
    pub fn total_count(&self, text: &str) -> Option<usize> {
        for re in &self.total_patterns {
            let Some(raw) = re.captures(text).and_then(|c| c.get(1)) else {
                continue;
            };
            let digits: String = raw.as_str().chars().filter(char::is_ascii_digit).collect();
            match digits.parse::<usize>() {
                Ok(total) => {
                    debug!("Total count '{}' matched by {}", raw.as_str(), re.as_str());
                    return Some(total);
                }
                Err(_) => continue,
            }
        }
        None
    }

    /// No-results phrasing takes precedence over any count
    pub fn read(&self, text: &str) -> PageSignal {
        if self.is_authoritative_zero(text) {
            return PageSignal::NoResults;
        }
        match self.total_count(text) {
            Some(0) => PageSignal::NoResults,
            Some(total) => PageSignal::Total(total),
            None => PageSignal::Unknown,
        }
    }
}
