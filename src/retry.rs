//! Fixed-delay retry for async operations.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many extra attempts to make, and how long to wait between them.
///
/// Every failure counts as retryable. There is no backoff and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Pause before each additional attempt.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given budget and delay.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Runs `op`, re-running it after `policy.delay` whenever it fails, until it
/// succeeds or the budget is spent. The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = policy.delay.as_millis() as u64,
                    "retrying after error: {e}"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_makes_budget_plus_one_attempts() {
        for budget in [0u32, 1, 2, 5] {
            let calls = AtomicU32::new(0);
            let policy = RetryPolicy::new(budget, Duration::from_secs(1));

            let result: Result<(), String> = with_retry(&policy, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {n}")) }
            })
            .await;

            assert_eq!(calls.load(Ordering::SeqCst), budget + 1);
            // The last failure comes back unchanged.
            assert_eq!(result.unwrap_err(), format!("failure {budget}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<&str, &str> = with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("transient")
                } else {
                    Ok("recipe")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("recipe"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        let _: Result<(), &str> = with_retry(&policy, || async { Err("down") }).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_first_success_does_not_sleep() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_retry(&RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
