//! Caller-side retry for whole flows
//!
//! Only `RelayUnreachable` is retried. Everything else, including
//! verification failures and local rejections, is returned on first sight.
//! The orchestrator never retries on its own.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::interop::errors::InteropError;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled each time (ms)
    pub base_delay_ms: u64,
    /// Upper bound of random jitter added to each delay (ms)
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_jitter_ms: 0,
        }
    }

    /// Delay before attempt `attempt + 1`, given `attempt` already failed (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let base = self.base_delay_ms.saturating_mul(1u64 << exp);
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(base.saturating_add(jitter))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempts are exhausted. Returns the last error in the latter case.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, InteropError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, InteropError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "attempt {}/{} failed: {} (retrying in {:?})",
                    attempt, max_attempts, e, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_jitter_ms: 1,
        }
    }

    fn unreachable() -> InteropError {
        InteropError::RelayUnreachable {
            address: "a".to_string(),
            reason: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = run_with_retry(&fast_policy(3), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unreachable())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = run_with_retry(&fast_policy(2), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unreachable())
        })
        .await;

        assert!(matches!(result, Err(InteropError::RelayUnreachable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = run_with_retry(&fast_policy(5), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(InteropError::ViewVerificationFailed {
                address: "a".to_string(),
                reason: "bad proof".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_growth() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_jitter_ms: 0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));

        let jittered = RetryPolicy { max_jitter_ms: 50, ..policy }.delay_for(1);
        assert!(jittered >= Duration::from_millis(100) && jittered <= Duration::from_millis(150));
    }
}
