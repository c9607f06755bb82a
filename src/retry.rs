//! Exponential-backoff retry for transport-class failures.
//!
//! Opt-in: nothing inside the client retries on its own. The wrapper
//! re-invokes an operation only when [`EipError::is_retryable`] says the
//! failure was a deadline expiry or a connection-reset-class error;
//! CIP statuses, type mismatches, and precondition failures come back
//! immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

/// Backoff parameters for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling the doubling delay never exceeds.
    pub max_delay: Duration,
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt budget and default delays.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }
}

/// Runs `operation`, retrying retryable failures with doubling delays.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once the attempt budget is spent.
///
/// ```no_run
/// use ethertag::{CipType, PlcClient, RetryPolicy};
///
/// # async fn demo(client: &PlcClient) -> ethertag::Result<()> {
/// let value = ethertag::retry_with_backoff(RetryPolicy::default(), || {
///     client.read_tag("Counter", CipType::Dint)
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                warn!(error = %e, attempt, "transient failure, backing off");
                sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EipError;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_attempts: attempts,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(quick_policy(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(EipError::Timeout(Duration::from_millis(1)))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(quick_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(EipError::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "rst",
                )))
            }
        })
        .await;
        assert!(matches!(result.unwrap_err(), EipError::Io(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cip_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(quick_policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(EipError::CipStatus {
                    code: 0x05,
                    description: "Path destination unknown",
                })
            }
        })
        .await;
        assert!(matches!(result.unwrap_err(), EipError::CipStatus { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn preconditions_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(quick_policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EipError::precondition("session not registered")) }
        })
        .await;
        assert!(matches!(result.unwrap_err(), EipError::Precondition(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
