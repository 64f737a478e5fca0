//! Bounded retry for transient network failures.
//!
//! Only failures where no response arrived (connect errors, timeouts) are
//! retried. Any HTTP response, whatever its status, ends the loop: retrying a
//! rejected write risks a duplicate post.

use std::time::Duration;

use {mentionbot_config::RetryConfig, tracing::warn};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Wait before retry number `retry` (1-based): exponential, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

/// Send a request built fresh for every attempt.
///
/// `build` runs once per attempt so signed requests get a new nonce and
/// timestamp each time.
pub(crate) async fn send_with_retry<F>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut build: F,
) -> Result<reqwest::Response>
where
    F: FnMut() -> Result<reqwest::RequestBuilder>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match build()?.send().await {
            Ok(resp) => return Ok(resp),
            Err(e) if is_transient(&e) && attempt < max_attempts => {
                let wait = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %e,
                    "transient network failure, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            },
            Err(source) => {
                return Err(Error::Network {
                    attempts: attempt,
                    source,
                });
            },
        }
    }
}
