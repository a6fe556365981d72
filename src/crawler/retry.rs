//! Fixed-delay retry helper
//!
//! Runs an async operation up to a fixed number of attempts, waiting a constant
//! delay between them. It is applied by the HTTP page fetcher, never by the crawl
//! engine itself.

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,

    /// Wait between two consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A policy that tries exactly once
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.attempts, config.delay())
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are used up
///
/// Returns the first success, or the error of the last attempt.
///
/// # Example
///
/// ```
/// use lesson_harvest::crawler::{retry_with_delay, RetryPolicy};
///
/// # async fn example() {
/// let result: Result<u32, String> =
///     retry_with_delay(RetryPolicy::none(), "answer", || async { Ok(42) }).await;
/// assert_eq!(result, Ok(42));
/// # }
/// ```
pub async fn retry_with_delay<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}",
                    attempt,
                    policy.max_attempts,
                    label,
                    e
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
            Err(e) => {
                tracing::debug!("Giving up on {} after {} attempt(s)", label, attempt);
                return Err(e);
            }
        }
    }
}
