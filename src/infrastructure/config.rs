//! Configuration infrastructure
//!
//! Contains configuration loading for the listing survey.
//!
//! Sources are layered in this order (later wins):
//! 1. Built-in defaults (`defaults` module)
//! 2. Config file (`--config` path, or `emlak-sweep.*` / `config/emlak-sweep.*`
//!    in the working directory, or `<user config dir>/emlak-sweep/config.*`)
//! 3. Environment variables prefixed `EMLAK__` (e.g. `EMLAK__SWEEP__LOCATION_DELAY_MS`)

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::Site;
use crate::infrastructure::parsing::config::SiteParsingConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpSettings,
    pub retry: RetrySettings,
    pub pagination: PaginationSettings,
    pub render: RenderSettings,
    pub sampling: SamplingSettings,
    pub sweep: SweepSettings,
    pub sources: SourcesConfig,
    pub anomaly: AnomalySettings,
    pub output: OutputSettings,
    pub logging: LoggingConfig,
}

/// Request settings shared by the HTTP-backed sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub accept_language: String,
    pub referer: Option<String>,
    pub timeout_seconds: u64,
    /// Per-source request quota; each source gets its own limiter
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

/// Fixed-count, fixed-delay retry for transient page failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub max_pages: u32,
    /// Consecutive pages without new items before giving up (no total known)
    pub max_stale_pages: u32,
}

/// Remote headless-browser render service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// e.g. `http://localhost:3000/content`; `None` disables rendered sources
    pub endpoint: Option<String>,
    pub wait_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Fixed seed for reproducible sampling; entropy-seeded when absent
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub per_source_limit: usize,
    pub location_delay_ms: u64,
    pub concurrent_sources: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Sources queried for every location, in output order
    pub enabled: Vec<Site>,
    #[serde(default = "SiteParsingConfig::emlakjet")]
    pub emlakjet: SiteParsingConfig,
    #[serde(default = "SiteParsingConfig::tapu")]
    pub tapu: SiteParsingConfig,
    #[serde(default = "SiteParsingConfig::hepsiemlak")]
    pub hepsiemlak: SiteParsingConfig,
}

impl SourcesConfig {
    pub fn parsing_for(&self, site: Site) -> &SiteParsingConfig {
        match site {
            Site::Emlakjet => &self.emlakjet,
            Site::Tapu => &self.tapu,
            Site::Hepsiemlak => &self.hepsiemlak,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalySettings {
    /// Only rows of this site are analysed
    pub site: String,
    pub iqr_multiplier: f64,
    pub z_threshold: f64,
    pub std_epsilon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub summary_file: PathBuf,
    pub sweep_summary_file: PathBuf,
    pub anomaly_directory: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output (daily rolling)
    pub file_output: bool,

    /// Directory for log files; relative to the working directory
    pub directory: PathBuf,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: std::collections::HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            referer: Some(defaults::REFERER.to_string()),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_ATTEMPTS,
            delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            max_pages: defaults::MAX_PAGES,
            max_stale_pages: defaults::MAX_STALE_PAGES,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            wait_timeout_seconds: defaults::RENDER_WAIT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            per_source_limit: defaults::PER_SOURCE_LIMIT,
            location_delay_ms: defaults::LOCATION_DELAY_MS,
            concurrent_sources: true,
        }
    }
}

impl SweepSettings {
    pub fn location_delay(&self) -> Duration {
        Duration::from_millis(self.location_delay_ms)
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: vec![Site::Emlakjet, Site::Tapu],
            emlakjet: SiteParsingConfig::emlakjet(),
            tapu: SiteParsingConfig::tapu(),
            hepsiemlak: SiteParsingConfig::hepsiemlak(),
        }
    }
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            site: defaults::ANOMALY_SITE.to_string(),
            iqr_multiplier: defaults::IQR_MULTIPLIER,
            z_threshold: defaults::Z_THRESHOLD,
            std_epsilon: defaults::STD_EPSILON,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(defaults::OUTPUT_DIR),
            summary_file: PathBuf::from(defaults::SUMMARY_FILE),
            sweep_summary_file: PathBuf::from(defaults::SWEEP_SUMMARY_FILE),
            anomaly_directory: PathBuf::from(defaults::ANOMALY_DIR),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: PathBuf::from(defaults::LOG_DIR),
            module_filters: std::collections::HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load layered configuration; `path` must exist when given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                builder = builder
                    .add_source(config::File::with_name(defaults::CONFIG_FILE_STEM).required(false))
                    .add_source(
                        config::File::with_name(&format!("config/{}", defaults::CONFIG_FILE_STEM))
                            .required(false),
                    );
                if let Some(user_file) = Self::user_config_stem() {
                    builder = builder.add_source(config::File::with_name(&user_file).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sources.enabled"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `<user config dir>/emlak-sweep/config`, extension resolved by the loader
    fn user_config_stem() -> Option<String> {
        dirs::config_dir()
            .map(|dir| dir.join(defaults::CONFIG_FILE_STEM).join("config"))
            .and_then(|p| p.to_str().map(str::to_string))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |message: &str| {
            Err(ConfigError::Validation {
                message: message.to_string(),
            })
        };

        if self.retry.max_attempts == 0 {
            return fail("retry.max_attempts must be greater than 0");
        }
        if self.pagination.max_pages == 0 {
            return fail("pagination.max_pages must be greater than 0");
        }
        if self.pagination.max_stale_pages == 0 {
            return fail("pagination.max_stale_pages must be greater than 0");
        }
        if self.http.max_requests_per_second == 0 {
            return fail("http.max_requests_per_second must be greater than 0");
        }
        if self.anomaly.iqr_multiplier <= 0.0 || self.anomaly.z_threshold <= 0.0 {
            return fail("anomaly.iqr_multiplier and anomaly.z_threshold must be positive");
        }
        if self.anomaly.std_epsilon <= 0.0 {
            return fail("anomaly.std_epsilon must be positive");
        }
        if self.sources.enabled.is_empty() {
            return fail("sources.enabled must name at least one site");
        }
        Ok(())
    }
}

/// Built-in configuration constants
pub mod defaults {
    pub const CONFIG_FILE_STEM: &str = "emlak-sweep";
    pub const ENV_PREFIX: &str = "EMLAK";

    /// Browser-like user agent; the sites serve reduced markup to unknown agents
    pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7";
    pub const REFERER: &str = "https://www.google.com/";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 20;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;

    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 2000;

    pub const MAX_PAGES: u32 = 50;
    pub const MAX_STALE_PAGES: u32 = 3;

    pub const RENDER_WAIT_TIMEOUT_SECONDS: u64 = 15;

    pub const PER_SOURCE_LIMIT: usize = 10;
    pub const LOCATION_DELAY_MS: u64 = 3000;

    pub const ANOMALY_SITE: &str = "emlakjet";
    pub const IQR_MULTIPLIER: f64 = 1.5;
    pub const Z_THRESHOLD: f64 = 3.0;
    pub const STD_EPSILON: f64 = 1e-9;

    pub const OUTPUT_DIR: &str = "output";
    pub const SUMMARY_FILE: &str = "output/emlak_ozet.csv";
    pub const SWEEP_SUMMARY_FILE: &str = "output/emlak_ozet_turkiye.csv";
    pub const ANOMALY_DIR: &str = "output/sehir_bazli_anomaliler";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_DIR: &str = "logs";
}

/// Search URL builders, one per site slug convention
pub mod site_urls {
    use crate::domain::{Location, Site};

    /// Lowercase, fold Turkish letters, spaces to `-`, then form-encode
    pub fn slugify(text: &str) -> String {
        let folded: String = text
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'ç' => 'c',
                'ğ' => 'g',
                'ş' => 's',
                'ı' => 'i',
                'ö' => 'o',
                'ü' => 'u',
                ' ' => '-',
                other => other,
            })
            // "İ".to_lowercase() leaves a combining dot behind
            .filter(|c| *c != '\u{307}')
            .collect();
        url::form_urlencoded::byte_serialize(folded.as_bytes()).collect()
    }

    /// e.g. `https://www.emlakjet.com/satilik-konut/istanbul-kadikoy`
    pub fn emlakjet_url(location: &Location) -> String {
        format!(
            "{}/satilik-konut/{}-{}",
            Site::Emlakjet.base_url(),
            slugify(&location.city),
            slugify(&location.district)
        )
    }

    /// e.g. `https://www.tapu.com/konut/adana-saricam`
    pub fn tapu_url(location: &Location) -> String {
        format!(
            "{}/konut/{}-{}",
            Site::Tapu.base_url(),
            slugify(&location.city),
            slugify(&location.district)
        )
    }

    /// District only, e.g. `https://www.hepsiemlak.com/cukurova-satilik`
    pub fn hepsiemlak_url(location: &Location) -> String {
        format!(
            "{}/{}-satilik",
            Site::Hepsiemlak.base_url(),
            slugify(&location.district)
        )
    }

    pub fn search_url(site: Site, location: &Location) -> String {
        match site {
            Site::Emlakjet => emlakjet_url(location),
            Site::Tapu => tapu_url(location),
            Site::Hepsiemlak => hepsiemlak_url(location),
        }
    }
}
