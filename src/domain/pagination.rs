//! Pagination domain logic centralization.
//!
//! Responsibility:
//! - page URL convention (page 1 = bare search URL, page N = `?<param>=N`)
//! - per-call termination bookkeeping (page ceiling, unchanged-page streak,
//!   authoritative total ceiling)

use std::fmt;

/// Why a pagination run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page yielded no candidate cards (end of pagination)
    NoCandidates,
    /// The configured page ceiling was reached
    PageCeiling,
    /// Too many consecutive pages added nothing new
    StaleStreak,
    /// Collected items reached the site's own declared total
    TotalReached,
    /// The site declared zero matches for the query
    NoResults,
    /// A page could not be loaded (status, network, render)
    LoadFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::NoCandidates => "no candidate cards",
            StopReason::PageCeiling => "page ceiling reached",
            StopReason::StaleStreak => "unchanged-page streak",
            StopReason::TotalReached => "authoritative total reached",
            StopReason::NoResults => "no results for query",
            StopReason::LoadFailed => "page load failed",
        };
        f.write_str(s)
    }
}

/// Build the URL of `page` for a search URL using the site's page parameter
pub fn page_url(base_url: &str, page: u32, param: &str) -> String {
    if page <= 1 {
        return base_url.to_string();
    }
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{sep}{param}={page}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub max_pages: u32,
    pub max_stale_pages: u32,
}

/// Per-call termination state; never shared between calls
#[derive(Debug, Clone)]
pub struct PaginationState {
    limits: PaginationLimits,
    page: u32,
    stale_streak: u32,
    authoritative_total: Option<usize>,
}

impl PaginationState {
    pub fn new(limits: PaginationLimits) -> Self {
        Self {
            limits,
            page: 1,
            stale_streak: 0,
            authoritative_total: None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn is_first_page(&self) -> bool {
        self.page == 1
    }

    pub fn authoritative_total(&self) -> Option<usize> {
        self.authoritative_total
    }

    pub fn set_authoritative_total(&mut self, total: usize) {
        self.authoritative_total = Some(total);
    }

    /// True once the declared total caps further collection
    pub fn total_reached(&self, collected: usize) -> bool {
        self.authoritative_total.is_some_and(|total| collected >= total)
    }

    /// Close the current page and decide whether another one should be loaded.
    ///
    /// The stale streak only applies when no authoritative total is known.
    pub fn finish_page(&mut self, new_items: usize) -> Option<StopReason> {
        if new_items == 0 {
            self.stale_streak += 1;
        } else {
            self.stale_streak = 0;
        }

        if self.authoritative_total.is_none() && self.stale_streak >= self.limits.max_stale_pages {
            return Some(StopReason::StaleStreak);
        }

        if self.page >= self.limits.max_pages {
            return Some(StopReason::PageCeiling);
        }

        self.page += 1;
        None
    }
}
