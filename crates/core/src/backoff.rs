//! Exponential backoff around retrieval calls.
//!
//! Only errors classified as [`RetryClass::WithBackoff`] are retried; every
//! other error is handed back to the caller on the first failure.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::errors::{Result, RetryClass};

/// Default number of attempts, including the first one.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay before the first retry.
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Upper bound for a single delay, before jitter.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Upper bound for the random jitter added to each delay.
const DEFAULT_JITTER: Duration = Duration::from_millis(250);

/// Retry policy for GET style operations.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Growth factor applied per failed attempt.
    pub multiplier: f64,
    /// Cap for the exponential part of the delay.
    pub max_delay: Duration,
    /// Random extra delay in `0..=jitter`, spreads out concurrent retries.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl RetryPolicy {
    /// A policy that performs a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Exponential part of the delay after the failed attempt `attempt` (0-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Full delay after the failed attempt `attempt`, jitter included.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

/// Runs `operation` until it succeeds, fails with a terminal error, or the
/// policy runs out of attempts.
///
/// `label` is only used for logging, usually the requested URL.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if error.retry_class() == RetryClass::Never {
                    return Err(error);
                }
                if attempt >= max_attempts {
                    warn!(
                        "[Backoff] Giving up on {} after {} attempts: {}",
                        label, attempt, error
                    );
                    return Err(error);
                }
                let wait = policy.delay_for(attempt - 1);
                debug!(
                    "[Backoff] {} failed ({}), retrying in {:?} ({}/{})",
                    label, error, wait, attempt, max_attempts
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(4),
            jitter: Duration::ZERO,
        }
    }

    fn transient() -> Error {
        Error::Transient {
            status: 503,
            url: "http://localhost/contracts".to_string(),
        }
    }

    #[test]
    fn test_base_delay_grows_and_caps() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.base_delay(0), Duration::from_millis(100));
        assert_eq!(policy.base_delay(1), Duration::from_millis(200));
        assert_eq!(policy.base_delay(2), Duration::from_millis(400));
        assert_eq!(policy.base_delay(3), Duration::from_millis(500));
        assert_eq!(policy.base_delay(60), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(10),
            jitter: Duration::from_millis(5),
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(0);
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(15));
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(&fast_policy(5), "contracts", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff(&fast_policy(3), "contracts", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Transient { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff(&fast_policy(5), "contracts", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::AccountNotFound("123".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::AccountNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<()> = with_backoff(&fast_policy(0), "contracts", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
