//! Logging system configuration and initialization
//!
//! - Console output, optionally a daily-rolling log file
//! - Configuration file based log level control, `RUST_LOG` overrides it
//! - Structured JSON logging (optional)
//! - Timestamps in Turkey time (UTC+3)

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::{FixedOffset, Utc};
use lazy_static::lazy_static;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "emlak-sweep.log";
const TRT_OFFSET_SECONDS: i32 = 3 * 3600;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Time formatter for Turkey Time (UTC+3)
struct TrtTimeFormatter;

impl FormatTime for TrtTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let offset = FixedOffset::east_opt(TRT_OFFSET_SECONDS).ok_or(std::fmt::Error)?;
        let now = Utc::now().with_timezone(&offset);
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Filter from `RUST_LOG` if set, else the configured level with noisy
/// dependencies held back unless tracing everything
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut directives = vec![config.level.clone()];
    if !config.level.eq_ignore_ascii_case("trace") {
        directives.extend(
            ["reqwest=info", "hyper=warn", "hyper_util=warn", "h2=warn", "html5ever=warn", "selectors=warn"]
                .iter()
                .map(|d| (*d).to_string()),
        );
    }
    let mut module_filters: Vec<_> = config.module_filters.iter().collect();
    module_filters.sort();
    directives.extend(module_filters.into_iter().map(|(module, level)| format!("{module}={level}")));

    EnvFilter::try_new(directives.join(",")).map_err(|e| anyhow!("Invalid log filter: {}", e))
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let env_filter = build_env_filter(config)?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        // Logs go to stderr; stdout stays free for prompts and tables
        let console = fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(TrtTimeFormatter)
            .with_target(false);
        layers.push(console.boxed());
    }

    if config.file_output {
        std::fs::create_dir_all(&config.directory)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", config.directory, e))?;

        let file_appender = rolling::daily(&config.directory, LOG_FILE_PREFIX);
        let (file_writer, file_guard) = non_blocking(file_appender);

        // Store the guard globally to prevent it from being dropped
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(TrtTimeFormatter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(TrtTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        log_file_location(&config.directory);
    }

    Ok(())
}

fn log_file_location(directory: &Path) {
    info!("Log directory: {:?} (daily files prefixed {})", directory, LOG_FILE_PREFIX);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }

    #[test]
    fn test_module_filters_build() {
        let mut config = LoggingConfig::default();
        config
            .module_filters
            .insert("emlak_sweep::crawling".to_string(), "debug".to_string());
        assert!(build_env_filter(&config).is_ok());
    }
}
