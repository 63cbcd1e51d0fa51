//! Infrastructure layer for page loading, parsing, persistence and configuration
//!
//! Everything that touches the network, the filesystem or page markup lives
//! here behind small traits (`PageFetcher`, `PageRenderer`) so the crawling
//! and application layers can be exercised with in-memory fakes.

pub mod config; // Layered configuration and site URL builders
pub mod csv_store;
pub mod logging;
pub mod page_renderer;
pub mod parsing;
pub mod parsing_error;
pub mod retry_manager;
pub mod simple_http_client;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, site_urls};
pub use csv_store::{StoreError, StoreResult};
pub use logging::{init_logging, init_logging_with_config};
pub use page_renderer::{PageRenderer, RenderError, RenderServiceClient};
pub use parsing::{ParsingError, ParsingResult, SiteParsingConfig};
pub use retry_manager::RetryPolicy;
pub use simple_http_client::{FetchError, FetchedPage, HttpClient, HttpClientConfig, PageFetcher};
