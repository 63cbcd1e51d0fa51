//! Render capability for script-driven listing pages
//!
//! Some sites only build their result list in the browser. Rendering is
//! delegated to a headless-browser service reachable over HTTP (for example a
//! browserless `/content` endpoint): we post the URL plus a selector to wait
//! for and get the rendered HTML back.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::infrastructure::config::RenderSettings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Render timed out after {seconds}s: {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("Render service failed for {url}: {reason}")]
    Service { url: String, reason: String },

    #[error("Render service returned status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Render capability: load a URL in a browser, wait for an element set,
/// return the resulting HTML
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, wait_for: &str, timeout: Duration) -> Result<String, RenderError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    wait_for_selector: WaitForSelector<'a>,
}

#[derive(Debug, Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

/// Client for a remote render service
pub struct RenderServiceClient {
    client: Client,
    endpoint: String,
}

impl RenderServiceClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create render service client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// `None` when no endpoint is configured; rendered sources are then inert
    pub fn from_settings(settings: &RenderSettings) -> Result<Option<Self>> {
        settings
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .map(Self::new)
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, url: &str, wait_for: &str, timeout: Duration) -> Result<String, RenderError> {
        let body = RenderRequest {
            url,
            wait_for_selector: WaitForSelector {
                selector: wait_for,
                timeout: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::Service {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status.as_u16(), timeout));
        }

        response.text().await.map_err(|e| RenderError::Service {
            url: url.to_string(),
            reason: format!("Failed to read rendered body: {e}"),
        })
    }
}

/// The service answers 408 when the wait selector never appeared
fn status_error(url: &str, status: u16, wait: Duration) -> RenderError {
    match status {
        408 => RenderError::Timeout {
            url: url.to_string(),
            seconds: wait.as_secs(),
        },
        status => RenderError::Status {
            url: url.to_string(),
            status,
        },
    }
}

#[async_trait]
impl PageRenderer for RenderServiceClient {
    async fn render(&self, url: &str, wait_for: &str, timeout: Duration) -> Result<String, RenderError> {
        info!("🖥️ Rendering {} (waiting for '{}')", url, wait_for);

        // The service's own wait is bounded too; this also covers a hung service
        let outer = timeout + Duration::from_secs(5);
        match tokio::time::timeout(outer, self.request(url, wait_for, timeout)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    warn!("⚠️ {}", e);
                }
                result
            }
            Err(_) => {
                warn!("⏰ Render timed out: {}", url);
                Err(RenderError::Timeout {
                    url: url.to_string(),
                    seconds: outer.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = RenderRequest {
            url: "https://www.hepsiemlak.com/seyhan-satilik",
            wait_for_selector: WaitForSelector {
                selector: "li.listing-item",
                timeout: 15_000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["url"], "https://www.hepsiemlak.com/seyhan-satilik");
        assert_eq!(json["waitForSelector"]["selector"], "li.listing-item");
        assert_eq!(json["waitForSelector"]["timeout"], 15_000);
    }

    #[test]
    fn test_wait_timeout_status_maps_to_timeout() {
        let wait = Duration::from_secs(15);
        assert_eq!(
            status_error("https://x.test", 408, wait),
            RenderError::Timeout {
                url: "https://x.test".to_string(),
                seconds: 15
            }
        );
        assert!(matches!(
            status_error("https://x.test", 500, wait),
            RenderError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn test_disabled_without_endpoint() {
        let settings = RenderSettings::default();
        assert!(RenderServiceClient::from_settings(&settings).unwrap().is_none());

        let settings = RenderSettings {
            endpoint: Some("http://localhost:3000/content".to_string()),
            ..RenderSettings::default()
        };
        let client = RenderServiceClient::from_settings(&settings).unwrap().unwrap();
        assert_eq!(client.endpoint(), "http://localhost:3000/content");
    }
}
