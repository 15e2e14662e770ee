//! Bounded retry with exponential backoff, owned by the caller.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::warn;

use super::ApiError;

/// How many times, and how far apart, to retry a retryable call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            multiplier: 2.0,
            max_interval: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_multiplier(self.multiplier)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(None)
            .build();
        backoff.reset();
        backoff
    }

    /// Run `call` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` is used up.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        backoff::future::retry_notify(
            self.backoff(),
            || {
                attempt += 1;
                let current = attempt;
                let fut = call();
                async move {
                    fut.await.map_err(|err| {
                        if err.is_retryable() && current < max_attempts {
                            backoff::Error::transient(err)
                        } else {
                            backoff::Error::permanent(err)
                        }
                    })
                }
            },
            |err: ApiError, wait: Duration| {
                warn!(
                    operation = %operation,
                    error = %err,
                    wait_ms = wait.as_millis() as u64,
                    "Retryable failure, backing off"
                );
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_interval: Duration::from_millis(1),
            multiplier: 1.5,
            max_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let calls = AtomicU32::new(0);

        let result = fast(3)
            .run("stats", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(ApiError::new(503, "unavailable"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_never_exceeds_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = fast(2)
            .run("stats", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::new(500, "boom")) }
            })
            .await;

        assert_eq!(result.unwrap_err().status, 500);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = fast(5)
            .run("signal", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::new(404, "missing").with_code("SYMBOL_NOT_FOUND")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_is_single_attempt() {
        let calls = AtomicU32::new(0);

        let _ = RetryPolicy::none()
            .run("candles", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ApiError::market_data(0, "Binance API error: 0")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
