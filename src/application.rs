//! # Application
//!
//! Use cases built on the crawling and infrastructure layers.
//! - `orchestrator`: all sources for one location
//! - `location_sweep`: many locations, sequentially
//! - `anomaly_detector`: per-city outlier flags over summary rows

pub mod anomaly_detector;
pub mod location_sweep;
pub mod orchestrator;

pub use anomaly_detector::{AnomalyDetector, AnomalyReport};
pub use location_sweep::{LocationSurvey, LocationSweep, SkippedLocation, SweepOutcome};
pub use orchestrator::{AcquisitionOrchestrator, LocationReport};
