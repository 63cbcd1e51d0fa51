//! HTTP client for listing pages with rate limiting and error handling
//!
//! One client per source: each carries its own request quota so a slow site
//! never throttles the others. Retrying is left to the caller (see
//! `retry_manager`); this client reports each attempt's outcome once.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::config::HttpSettings;

/// Body and status of one page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure worth another attempt (timeout, reset, DNS)
    #[error("Transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },
}

/// Fetch capability: GET a URL, return status and body
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum requests per second to avoid overwhelming servers
    pub max_requests_per_second: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    pub accept_language: String,
    pub referer: Option<String>,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_requests_per_second: settings.max_requests_per_second,
            timeout_seconds: settings.timeout_seconds,
            user_agent: settings.user_agent.clone(),
            accept_language: settings.accept_language.clone(),
            referer: settings.referer.clone(),
            follow_redirects: settings.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_settings(&HttpSettings::default())
    }
}

/// HTTP client with a per-instance rate limiter
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
    /// Optional context label for provenance in logs (e.g. "emlakjet")
    context_label: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("Invalid Accept-Language")?,
        );
        if let Some(referer) = &config.referer {
            headers.insert(
                REFERER,
                HeaderValue::from_str(referer).context("Invalid Referer")?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            config,
            context_label: None,
        })
    }

    /// Set a context label for logging provenance (returns self for chaining)
    pub fn with_context_label(mut self, label: &str) -> Self {
        self.context_label = Some(label.to_string());
        self
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn label(&self) -> &str {
        self.context_label.as_deref().unwrap_or("http")
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.rate_limiter.until_ready().await;

        info!("🌐 [{}] HTTP GET: {}", self.label(), url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                warn!("⚠️ [{}] Network error for {}: {}", self.label(), url, e);
                FetchError::Transient {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| FetchError::Transient {
            url: url.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        debug!("[{}] {} -> {} ({} bytes)", self.label(), url, status, body.len());
        Ok(FetchedPage { status, body })
    }
}
