//! Bounded exponential-backoff retry for fallible async operations.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Outcome of an exhausted or misconfigured retry sequence.
///
/// The inner error of [`RetryError::Exhausted`] is the most recent failure,
/// unchanged, so callers can still match on its kind after the retries are
/// spent.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Caller configuration error; the operation was never invoked.
    #[error("retry attempts must be >= 1, got {0}")]
    InvalidAttempts(u32),

    /// Every attempt failed; carries the last failure.
    #[error("retries exhausted: {0}")]
    Exhausted(#[source] E),
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Recover the final underlying failure, if there was one.
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::InvalidAttempts(_) => None,
            RetryError::Exhausted(err) => Some(err),
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// The operation is invoked up to `attempts` times; after the i-th failure
/// (0-indexed) the task sleeps `base_delay * 2^i` before the next attempt.
/// No sleep follows the final failure. All failures are treated as
/// retryable here; kind-specific handling belongs to the caller, applied to
/// the error carried out of [`RetryError::Exhausted`].
///
/// Backoff sleeps suspend only this task. Dropping the returned future at
/// any await point cancels the remaining attempts.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut operation: F,
    attempts: u32,
    base_delay: Duration,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if attempts < 1 {
        return Err(RetryError::InvalidAttempts(attempts));
    }

    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(RetryError::Exhausted(err));
                }
                let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt - 1));
                warn!(
                    attempt,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom {0}")]
    struct Boom(u32);

    #[tokio::test(start_paused = true)]
    async fn returns_first_success_without_sleeping() {
        let start = Instant::now();
        let result: Result<u32, RetryError<Boom>> =
            retry_with_backoff(|| async { Ok(42) }, 3, Duration::from_millis(500)).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_exponentially_between_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<u32, RetryError<Boom>> = retry_with_backoff(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Boom(n))
                    } else {
                        Ok(7)
                    }
                }
            },
            3,
            Duration::from_millis(500),
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two failures: sleeps of 500ms (2^0) and 1000ms (2^1).
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_preserves_last_error_and_attempt_count() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<u32, RetryError<Boom>> = retry_with_backoff(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(Boom(n)) }
            },
            3,
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // k attempts means k-1 sleeps; no sleep after the final failure.
        assert_eq!(start.elapsed(), Duration::from_millis(100 + 200));

        match result.unwrap_err() {
            RetryError::Exhausted(err) => assert_eq!(err, Boom(2)),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_is_a_config_error_and_never_invokes() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<Boom>> = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Boom(0)) }
            },
            0,
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(result.unwrap_err(), RetryError::InvalidAttempts(0)));
    }

    #[tokio::test]
    async fn single_attempt_failure_exhausts_immediately() {
        let result: Result<u32, RetryError<Boom>> =
            retry_with_backoff(|| async { Err(Boom(9)) }, 1, Duration::from_secs(60)).await;
        let err = result.unwrap_err();
        assert_eq!(err.into_source(), Some(Boom(9)));
    }
}
