//! Exponential backoff for remote embedding calls.
//!
//! Only transport failures and server-side statuses are retried; a request the
//! provider rejected as malformed will fail the same way every time.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::SemanticError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Initial delay between retries, in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub base_delay: Duration,
    /// Upper bound on any single delay, in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Spread delays by ±25% so concurrent callers do not retry in lockstep.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (1-based; attempt 0 never waits).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponential =
            self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64) as u64;

        if self.jitter {
            let jitter_range = delay_ms / 4;
            if jitter_range > 0 {
                let jitter = fastrand::u64(0..jitter_range * 2);
                return Duration::from_millis(delay_ms - jitter_range + jitter);
            }
        }

        Duration::from_millis(delay_ms)
    }
}

/// Whether another attempt could plausibly succeed.
pub(crate) fn is_retryable(err: &SemanticError) -> bool {
    match err {
        SemanticError::HttpStatus { status, .. } => is_transient_status(*status),
        SemanticError::Download(_) | SemanticError::Io(_) => true,
        _ => false,
    }
}

/// Server-side failures plus request timeout and rate limiting.
fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. Returns the last error on exhaustion.
pub(crate) async fn execute_with_retry<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, SemanticError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SemanticError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_retries && is_retryable(&err) => {
                attempt += 1;
                let delay = config.calculate_delay(attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying embedding request");
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
