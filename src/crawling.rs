//! # Crawling
//!
//! Source adapters and the pagination machinery they share.
//! - `adapter`: the `SourceAdapter` contract
//! - `page_loader`: HTTP and render page loading with failure policy
//! - `pagination_driver`: page walk, termination, dedup and sampling
//! - `sources`: the per-site adapters

pub mod adapter;
pub mod page_loader;
pub mod pagination_driver;
pub mod sources;

pub use adapter::SourceAdapter;
pub use page_loader::{HttpPageLoader, OnLoadFailure, PageLoadError, PageLoader, RenderPageLoader};
pub use pagination_driver::{Collection, DriverSettings, ListingStrategy, PaginationDriver, sample_uniform};
pub use sources::{EmlakjetAdapter, HepsiemlakAdapter, TapuAdapter, build_enabled_adapters};
