//! Retry of transient store failures with exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::AuthResult;
use crate::config::AuthConfig;

/// How store operations are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Doubles on each retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.store_retry_attempts.max(1),
            initial_backoff: config.store_retry_backoff,
        }
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> AuthResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        let mut attempts = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts += 1;
                    if !e.is_transient() || attempts >= self.max_attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        operation,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Store operation failed, retrying"
                    );

                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}
