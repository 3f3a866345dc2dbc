//! Retry with exponential backoff
//!
//! Fetch retries are a cross-cutting policy, so they live in one reusable
//! wrapper instead of being inlined at each call site. The policy is uniform:
//! every failure kind (timeout, connection error, non-success status) is
//! retried the same way.

use std::future::Future;
use std::time::Duration;

use crate::{KumoError, Result};

/// Attempt count and backoff schedule for retried operations
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts, backoff 2s then 4s, capped at 10s
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// The pause after a failure on `attempt` (1-based)
    ///
    /// Doubles per attempt starting from `base_delay`, saturating at
    /// `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(exponent));
        delay.min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are exhausted
///
/// Sleeps the policy's backoff between attempts. The final error is returned
/// unchanged, so a caller cannot distinguish a first-attempt success from a
/// last-attempt one by anything except elapsed time.
///
/// # Arguments
///
/// * `policy` - Attempt count and backoff schedule
/// * `label` - Identifier for log lines, usually the URL
/// * `operation` - The I/O operation to retry; invoked once per attempt
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    "Attempt {}/{} failed for {}: {} (retrying in {:?})",
                    attempt,
                    policy.max_attempts,
                    label,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
