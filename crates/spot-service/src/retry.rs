//! # Retry Policy
//!
//! Replays a whole transactional operation when it fails with
//! [`ShopError::Transient`](crate::ShopError::Transient) (SQLite busy/locked,
//! pool timeout).
//!
//! ```text
//! attempt 1 ──► Transient ──► sleep(base) ──► attempt 2 ──► Transient
//!          ──► sleep(base × 2) ──► attempt 3 ──► Transient ──► give up
//! ```
//!
//! Every other error, and success, returns immediately. Each attempt starts a
//! fresh transaction, so a failed attempt leaves nothing behind.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ShopResult;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff with base and max.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given retry number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u32.saturating_pow(attempt);
                std::cmp::min(base.saturating_mul(multiplier), *max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(25),
            max: Duration::from_secs(1),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::default(),
        }
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Runs `attempt` until it succeeds, fails with a non-retriable error,
    /// or `max_attempts` is used up.
    ///
    /// On exhaustion the last `Transient` error is returned.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> ShopResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ShopResult<T>>,
    {
        let mut tries = 0u32;

        loop {
            tries += 1;

            match attempt().await {
                Err(err) if err.is_retriable() => {
                    if tries >= self.max_attempts {
                        warn!(
                            operation,
                            attempts = tries,
                            error = %err,
                            "Giving up after transient failures",
                        );
                        return Err(err);
                    }

                    let delay = self.backoff.delay_for_attempt(tries - 1);
                    warn!(
                        operation,
                        attempt = tries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShopError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_delays_are_capped() {
        let backoff = BackoffStrategy::Exponential {
            base: Duration::from_millis(25),
            max: Duration::from_millis(80),
        };

        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(25));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(50));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(80));
        assert_eq!(backoff.delay_for_attempt(40), Duration::from_millis(80));
    }

    #[test]
    fn test_new_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3).with_backoff(BackoffStrategy::None);

        let result = policy
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ShopError::Transient("database is locked".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_transient() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(2).with_backoff(BackoffStrategy::None);

        let result: ShopResult<()> = policy
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ShopError::Transient("database is locked".into()))
            })
            .await;

        assert!(matches!(result, Err(ShopError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(5).with_backoff(BackoffStrategy::None);

        let result: ShopResult<()> = policy
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ShopError::InsufficientStock {
                    product_id: "p".into(),
                    requested: 2,
                    available: 1,
                })
            })
            .await;

        assert!(matches!(result, Err(ShopError::InsufficientStock { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
