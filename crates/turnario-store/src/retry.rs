//! Retry policy for remote store operations.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::StoreError;

/// Ceiling on any single backoff sleep, server-suggested or not.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Bounded-retry wrapper for operations that can fail transiently.
///
/// Only errors classified transient by [`StoreError::is_transient`] are
/// retried; everything else propagates immediately. Rate-limit responses
/// prefer the server-suggested delay over the exponential default.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Base delay; attempt `n` sleeps `base_delay * 2^n` unless the server
    /// suggested otherwise.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Run `op`, retrying transient failures until attempts are exhausted.
    /// The last error propagates to the caller.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt, &err);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient store error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn delay_for(&self, attempt: u32, err: &StoreError) -> Duration {
        let exponential = self.base_delay * 2u32.pow(attempt.min(16));
        err.retry_after().unwrap_or(exponential).min(MAX_BACKOFF)
    }
}
