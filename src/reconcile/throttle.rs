//! Bounded retry for throttled read calls
//!
//! Read paths retry only on throttling. A not-found classification resolves
//! to `Ok(None)`; every other failure stops the loop. The attempt counter
//! lives on the stack of each call.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::RetryConfig;
use crate::error::{ProtocolError, RemoteError, RetryableError};

/// Upper bound for a single backoff delay
const MAX_BACKOFF_MS: u64 = 10_000;

/// Read-path retry protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRetryProtocol {
    max_attempts: u32,
    backoff_ms: u64,
}

impl Default for ThrottleRetryProtocol {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl ThrottleRetryProtocol {
    /// Create a protocol allowing `max_attempts` attempts with no delay
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_ms: 0,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_throttle_retries,
            backoff_ms: config.throttle_backoff_ms,
        }
    }

    /// Base delay between throttled attempts
    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Execute a read operation, retrying while it is throttled
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` on success, `Ok(None)` when the resource does not
    /// exist, or [`ProtocolError::RetriesExhausted`] carrying the last failure
    /// when no attempt succeeded.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<Option<T>, ProtocolError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0u32;
        let mut last_error = None;

        while attempt < self.max_attempts {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(Some(value)),
                Err(err) if err.is_absent() => {
                    info!(attempt = attempt, "Resource not found");
                    return Ok(None);
                }
                Err(err) if err.is_retryable() => {
                    info!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Caught throttling error"
                    );
                    last_error = Some(err);

                    if attempt < self.max_attempts {
                        let backoff = self.calculate_backoff(attempt - 1);
                        if !backoff.is_zero() {
                            debug!(backoff_ms = backoff.as_millis(), "Backing off");
                            tokio::time::sleep(backoff).await;
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        attempt = attempt,
                        kind = %err.kind,
                        error = %err,
                        request_id = ?err.request_id,
                        "Read failed with a non-retryable error"
                    );
                    last_error = Some(err);
                    break;
                }
            }
        }

        error!(attempts = attempt, "Unable to resolve request within retry bound");
        Err(ProtocolError::RetriesExhausted {
            attempts: attempt,
            last_error,
        })
    }

    /// Backoff before the attempt following `attempt` (zero based)
    ///
    /// Exponential on the configured base, capped, with 50-100% jitter.
    /// A zero base disables the delay entirely.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if self.backoff_ms == 0 {
            return Duration::ZERO;
        }

        let base = self.backoff_ms as f64 * 2f64.powi(attempt as i32);
        let capped = base.min(MAX_BACKOFF_MS as f64);
        let jitter = rand::thread_rng().gen_range(0.5..1.0);

        Duration::from_secs_f64(capped * jitter / 1000.0)
    }
}
