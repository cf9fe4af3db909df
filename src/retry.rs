//! Bounded retry with linear backoff
//!
//! TTS calls fail transiently often enough to warrant retries; the policy
//! is a fixed attempt budget with a linearly growing pause between
//! attempts. The combinator is generic over the remote call so any flaky
//! external operation can reuse it.

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Retry policy for flaky remote calls
///
/// Controls how many times a failed call is attempted and how long to
/// wait between attempts using linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget (first try included)
    pub max_attempts: u32,
    /// Base delay; attempt `n` sleeps `backoff * n` before the next try
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Compute the pause after failed attempt `attempt` (counted from 1).
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy.backoff.saturating_mul(attempt)
}

/// Run `op` up to `policy.max_attempts` times, sleeping between failures.
///
/// Returns the first success, or the last error once the budget is
/// exhausted. Each failed attempt is logged with the `label` so chunked
/// callers can report which unit of work was retried.
///
/// # Errors
///
/// Returns the final attempt's error, or a configuration error if the
/// policy allows zero attempts.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if policy.max_attempts == 0 {
        return Err(Error::Config(format!(
            "retry policy for {label} allows zero attempts"
        )));
    }

    let mut last_err = None;
    for attempt in 1..=policy.max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "attempt failed"
                );
                last_err = Some(e);
                if attempt < policy.max_attempts {
                    tokio::time::sleep(delay_for_attempt(policy, attempt)).await;
                }
            }
        }
    }

    Err(last_err.map_or_else(
        || Error::Config(format!("retry of {label} produced no error")),
        |e| e,
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fast policy so tests don't sleep for real
    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    // -- delay_for_attempt ----------------------------------------------------

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        };
        assert_eq!(delay_for_attempt(&policy, 1), Duration::from_secs(1));
        assert_eq!(delay_for_attempt(&policy, 2), Duration::from_secs(2));
        assert_eq!(delay_for_attempt(&policy, 3), Duration::from_secs(3));
    }

    // -- retry ----------------------------------------------------------------

    #[tokio::test]
    async fn returns_first_success_without_retrying() {
        let calls = AtomicU32::new(0);
        let result = retry(&fast_policy(3), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry(&fast_policy(3), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err(Error::Tts("transient".to_string()))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&fast_policy(3), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Tts("always down".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(Error::Tts(_))));
    }

    #[tokio::test]
    async fn zero_attempt_policy_is_an_error() {
        let result: Result<()> = retry(&fast_policy(0), "op", || async { Ok(()) }).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    // -- Default policy -------------------------------------------------------

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(1));
    }
}
