//! Exponential backoff for rate-limited upstream calls.
//!
//! Only [`ProviderError::RateLimited`] is retried. Everything else, including
//! a 403, is handed back to the caller after a single attempt.

use std::{future::Future, time::Duration};

use tracing::{debug, warn};

use crate::{ProviderError, Result};

/// How many times a rate-limited request is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `0` is treated as `1`.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every following retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff before retrying after the given zero-based attempt: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Source of backoff waits. Production code sleeps on the tokio timer; tests
/// substitute an implementation that records the requested delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Run `operation`, retrying with exponential backoff while upstream answers 429.
///
/// Exhausting the policy yields [`ProviderError::RateLimited`] carrying the
/// number of attempts made.
pub async fn fetch_with_retry<T, F, Fut, S>(
    policy: &RetryPolicy,
    sleeper: &S,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: Sleeper,
{
    let attempts = policy.attempts();

    for attempt in 0..attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(retries = attempt, "Upstream request succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if e.is_rate_limited() => {
                if attempt + 1 >= attempts {
                    break;
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Upstream rate limited, backing off"
                );
                sleeper.sleep(delay).await;
            }
            Err(e) => {
                debug!(error = %e, "Non-retryable upstream error");
                return Err(e);
            }
        }
    }

    Err(ProviderError::RateLimited { attempts })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.delays.lock().unwrap().push(duration);
            std::future::ready(())
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited { attempts: 1 }
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(u64::MAX / 2));
        assert_eq!(policy.delay_for(40), Duration::MAX);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let result = fetch_with_retry(&RetryPolicy::default(), &sleeper, || {
            calls += 1;
            async { Ok::<_, ProviderError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let result = fetch_with_retry(&RetryPolicy::default(), &sleeper, || {
            calls += 1;
            let call = calls;
            async move {
                if call <= 2 {
                    Err(rate_limited())
                } else {
                    Ok("listings")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "listings");
        assert_eq!(calls, 3);

        let delays = sleeper.delays();
        assert_eq!(delays.len(), 2, "Should sleep once per retry");
        assert!(delays[0] < delays[1], "Backoff should strictly increase");
        assert_eq!(delays[0], Duration::from_millis(1000));
        assert_eq!(delays[1], Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let result: Result<()> = fetch_with_retry(&RetryPolicy::default(), &sleeper, || {
            calls += 1;
            async { Err(ProviderError::Unauthorized) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Unauthorized)));
        assert_eq!(calls, 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_propagate_immediately() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let result: Result<()> = fetch_with_retry(&RetryPolicy::default(), &sleeper, || {
            calls += 1;
            async { Err(ProviderError::Unavailable("HTTP 502".into())) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_rate_limited() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let result: Result<()> = fetch_with_retry(&RetryPolicy::default(), &sleeper, || {
            calls += 1;
            async { Err(rate_limited()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(ProviderError::RateLimited { attempts: 3 })
        ));
        assert_eq!(calls, 3);
        assert_eq!(sleeper.delays().len(), 2, "No sleep after the last attempt");
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;

        let result: Result<()> =
            fetch_with_retry(&RetryPolicy::new(0, Duration::from_millis(1)), &sleeper, || {
                calls += 1;
                async { Err(rate_limited()) }
            })
            .await;

        assert!(matches!(
            result,
            Err(ProviderError::RateLimited { attempts: 1 })
        ));
        assert_eq!(calls, 1);
        assert!(sleeper.delays().is_empty());
    }
}
