//! Retry policy for page loads
//!
//! Fixed attempt count, fixed delay between attempts. Only errors the caller
//! classifies as retryable are retried; anything else returns immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::infrastructure::config::RetrySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; zero is treated as one
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or attempts run out. The last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut, R>(&self, label: &str, mut operation: F, is_retryable: R) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if is_retryable(&e) && attempt < self.max_attempts => {
                    warn!(
                        "🔄 {} failed (attempt {}/{}): {}; retrying in {:?}",
                        label, attempt, self.max_attempts, e, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("❌ {} failed after {} attempt(s): {}", label, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}
