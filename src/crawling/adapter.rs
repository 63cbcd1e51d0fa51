//! # Source Adapter
//!
//! The contract every listing source fulfils: given a search URL and a
//! limit, return at most `limit` distinct listings with positive prices.
//! Adapters never fail outward; "no data" is an empty vector.

use async_trait::async_trait;

use crate::domain::{Listing, Site};

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Site whose listings this adapter produces
    fn site(&self) -> Site;

    /// Fetch listings for one search; all per-call state stays inside the call
    async fn fetch_listings(&self, search_url: &str, limit: usize) -> Vec<Listing>;
}
