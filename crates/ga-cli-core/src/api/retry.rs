//! Bounded retry with exponential backoff for transient API failures.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{error, warn};

use super::ApiError;

/// Maximum number of attempts made for a transient failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base of the exponential backoff: the n-th retry waits `factor^n` seconds.
pub const DEFAULT_BACKOFF_FACTOR: u64 = 2;

/// Suspension point between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_FACTOR)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("backoff_factor", &self.backoff_factor)
            .finish()
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: u64) -> Self {
        Self {
            max_retries,
            backoff_factor,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Delay before the retry following failed attempt number `attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_factor.saturating_pow(attempt))
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// Non-transient failures are returned immediately. Once `max_retries`
    /// attempts have failed transiently the last failure is returned. The
    /// operation always runs at least once, even with `max_retries == 0`.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;

        while attempt < self.max_retries {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        error!(
                            operation = label,
                            max_retries = self.max_retries,
                            error = %err,
                            "Max retries exceeded"
                        );
                        return Err(err);
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        operation = label,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "Transient error, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }

        operation().await
    }
}
