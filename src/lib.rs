//! Emlak Sweep - real-estate listing price survey
//!
//! Scrapes asking prices for a (city, district) from several Turkish listing
//! sites, summarizes them per source, and flags districts whose average price
//! is anomalous within their city.

// Module declarations
pub mod application;
pub mod cli;
pub mod crawling;
pub mod domain;
pub mod infrastructure;

pub use application::{AcquisitionOrchestrator, AnomalyDetector, LocationSweep};
pub use domain::{Listing, Location, Site};
pub use infrastructure::AppConfig;
