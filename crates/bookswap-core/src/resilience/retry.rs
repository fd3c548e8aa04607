//! Network-aware retry with a fixed (or optionally exponential) delay.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::result::AppResult;

/// How the delay between attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed,
    /// The delay doubles after every retry, capped at `max_delay`.
    Exponential,
}

/// Retry parameters for [`retry_with_connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub delay: Duration,
    /// Delay growth strategy.
    pub backoff: Backoff,
    /// Upper bound for exponential delays.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A constant-delay policy.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            backoff: Backoff::Fixed,
            max_delay: delay,
        }
    }

    /// A doubling-delay policy.
    pub fn exponential(max_retries: u32, base: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            delay: base,
            backoff: Backoff::Exponential,
            max_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                self.delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(2, Duration::from_secs(1))
    }
}

/// Execute `op`, retrying transient failures according to `policy`.
///
/// Returns the first successful result. Non-transient errors (validation,
/// not-found, configuration, ...) are returned immediately; the last
/// transient error is returned once all retries are spent.
pub async fn retry_with_connection<T, F, Fut>(
    op_name: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= policy.max_retries {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                debug!(
                    op = op_name,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let started = tokio::time::Instant::now();

        let result = retry_with_connection(
            "flaky",
            &RetryPolicy::fixed(3, Duration::from_millis(500)),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(AppError::database("connection reset"))
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: AppResult<()> = retry_with_connection(
            "down",
            &RetryPolicy::fixed(2, Duration::from_millis(100)),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::service_unavailable("offline")) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_validation_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: AppResult<()> = retry_with_connection(
            "bad-input",
            &RetryPolicy::fixed(5, Duration::from_secs(10)),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::validation("malformed id")) }
            },
        )
        .await;

        assert_eq!(result.unwrap_err().kind, crate::error::ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40), Duration::from_millis(350));
    }
}
