//! Retry utilities for resilient operations
//!
//! This module provides the bounded retry used by the feed client and the
//! delivery channels. Attempts are immediate by default; a base delay turns
//! on exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempts made before giving up on an upstream call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, first one included
    pub max_attempts: u32,

    /// Base delay in milliseconds for exponential backoff (0 = retry immediately)
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: 0,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with a custom attempt budget
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a retry configuration with custom delays
    pub fn with_delays(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before the given retry (1 = first retry)
    fn calculate_delay(&self, retry: u32) -> Duration {
        let delay_ms = if retry == 0 || self.base_delay_ms == 0 {
            0
        } else {
            let exponential =
                self.base_delay_ms as f64 * self.backoff_multiplier.powi((retry - 1) as i32);
            (exponential as u64).min(self.max_delay_ms)
        };

        Duration::from_millis(delay_ms)
    }
}

/// Failure returned when an operation did not succeed within its budget
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts actually made
    pub attempts: u32,

    /// The last error observed
    pub error: E,

    /// True when the budget ran out, false when a non-retryable error stopped the loop
    pub exhausted: bool,
}

/// Execute an operation with retry logic, using a custom retry predicate
///
/// Errors rejected by `should_retry` end the loop immediately. Once
/// `max_attempts` attempts have failed, the last error is returned with
/// `exhausted` set.
///
/// # Example
///
/// ```no_run
/// use weekly_report::utils::retry::{with_retry_if, RetryConfig};
///
/// # async fn example() {
/// let config = RetryConfig::default();
/// let result = with_retry_if(
///     &config,
///     || async { Ok::<_, std::io::Error>(42) },
///     |e| e.kind() != std::io::ErrorKind::PermissionDenied,
/// )
/// .await;
/// assert_eq!(result.unwrap(), 42);
/// # }
/// ```
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation: F,
    should_retry: P,
) -> Result<T, RetryFailure<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            let delay = config.calculate_delay(attempt - 1);
            if !delay.is_zero() {
                debug!(
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying operation after delay"
                );
                tokio::time::sleep(delay).await;
            }
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    warn!(attempt = attempt, error = %e, "Non-retryable error encountered");
                    return Err(RetryFailure {
                        attempts: attempt,
                        error: e,
                        exhausted: false,
                    });
                }

                warn!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %e,
                    "Operation failed"
                );

                if attempt >= max_attempts {
                    return Err(RetryFailure {
                        attempts: attempt,
                        error: e,
                        exhausted: true,
                    });
                }
            }
        }
    }
}
