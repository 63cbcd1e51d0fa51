//! # Page Loaders
//!
//! How a pagination run obtains the HTML of one result page: a plain HTTP
//! fetch with bounded retries, or a browser render through a render service.
//! The loader also decides what a failed load means for the items already
//! collected in the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::infrastructure::page_renderer::{PageRenderer, RenderError};
use crate::infrastructure::retry_manager::RetryPolicy;
use crate::infrastructure::simple_http_client::{FetchError, PageFetcher};

/// What a failed page load does to the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnLoadFailure {
    /// Stop paginating, return what was collected so far
    KeepCollected,
    /// Abandon the whole call with an empty result
    DiscardAll,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageLoadError {
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("Render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    /// The awaited listing elements never appeared
    #[error("No listing elements appeared within {seconds}s on {url}")]
    WaitTimedOut { url: String, seconds: u64 },

    #[error("No render service configured for {url}")]
    RendererUnavailable { url: String },
}

impl PageLoadError {
    /// A loaded page that simply has no listings; past page 1 this is the
    /// end of the result pages, not a failure
    pub fn is_empty_page(&self) -> bool {
        matches!(self, PageLoadError::WaitTimedOut { .. })
    }
}

#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String, PageLoadError>;

    fn on_failure(&self) -> OnLoadFailure;
}

/// HTTP GET with fixed-count, fixed-delay retries on transient failures.
/// A non-success status is final.
pub struct HttpPageLoader {
    fetcher: Arc<dyn PageFetcher>,
    retry: RetryPolicy,
}

impl HttpPageLoader {
    pub fn new(fetcher: Arc<dyn PageFetcher>, retry: RetryPolicy) -> Self {
        Self { fetcher, retry }
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    async fn load(&self, url: &str) -> Result<String, PageLoadError> {
        let fetcher = &self.fetcher;
        let page = self
            .retry
            .run(
                url,
                move |_| fetcher.fetch(url),
                |e: &FetchError| matches!(e, FetchError::Transient { .. }),
            )
            .await?;

        if !page.is_success() {
            return Err(PageLoadError::Status {
                url: url.to_string(),
                status: page.status,
            });
        }
        Ok(page.body)
    }

    fn on_failure(&self) -> OnLoadFailure {
        OnLoadFailure::KeepCollected
    }
}

/// Browser render bounded by a wait timeout. A failure voids the call,
/// except a wait timeout after page 1, which the driver reads as the last page
pub struct RenderPageLoader {
    renderer: Option<Arc<dyn PageRenderer>>,
    wait_for: String,
    timeout: Duration,
}

impl RenderPageLoader {
    pub fn new(renderer: Option<Arc<dyn PageRenderer>>, wait_for: &str, timeout: Duration) -> Self {
        Self {
            renderer,
            wait_for: wait_for.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl PageLoader for RenderPageLoader {
    async fn load(&self, url: &str) -> Result<String, PageLoadError> {
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| PageLoadError::RendererUnavailable { url: url.to_string() })?;

        renderer
            .render(url, &self.wait_for, self.timeout)
            .await
            .map_err(|e| match e {
                RenderError::Timeout { url, seconds } => PageLoadError::WaitTimedOut { url, seconds },
                other => PageLoadError::Render {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    fn on_failure(&self) -> OnLoadFailure {
        OnLoadFailure::DiscardAll
    }
}
