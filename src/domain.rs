//! Domain module - Core entities of the listing survey
//!
//! Listings and their per-location summaries, survey locations,
//! pagination bookkeeping and outlier annotations.

pub mod anomaly;
pub mod listing;
pub mod location;
pub mod pagination;

// Re-export commonly used items
pub use anomaly::{CityStats, FlagCount, OutlierFlag, OutlierRow, RawSummaryRow};
pub use listing::{DetailRow, Listing, Site, SummaryRow, UnknownSite, average_price, round2};
pub use location::Location;
pub use pagination::{PaginationLimits, PaginationState, StopReason, page_url};
