//! # Retry With Backoff
//!
//! Explicit retry loop for operations that must eventually succeed, such as
//! plugin bootstrap: a failed bootstrap permanently disables the lane, so
//! the factory retries until the chain cooperates.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff schedule for [`retry_with_backoff`].
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for the doubling delay.
    pub max_delay: Duration,
    /// Give up after this many attempts; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

/// Run `operation` until it succeeds, sleeping between attempts with
/// exponential backoff. Each failure is logged; the only other side effect
/// of a retry is the delay itself.
///
/// Returns the last error when `max_attempts` is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = config.initial_delay;
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt = attempt.saturating_add(1);
                if let Some(max) = config.max_attempts {
                    if attempt >= max {
                        return Err(err);
                    }
                }
                warn!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "operation failed, retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(config.max_delay);
            }
        }
    }
}
