//! Bounded retry with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// How often and how patiently a remote call is repeated.
///
/// The delay before retry `k` (0-based) is `initial_backoff * 2^k`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use critic_review::retry::RetryPolicy;
///
/// let policy = RetryPolicy::fetch();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.backoff(0), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Give up instead of sleeping past this much total time.
    pub max_elapsed: Option<Duration>,
}

impl RetryPolicy {
    /// Policy for GitHub listing and raw content downloads: 3 attempts, 1 s doubling.
    pub fn fetch() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_elapsed: None,
        }
    }

    /// Policy for completion calls: 3 attempts, 1 s doubling, 30 s budget.
    pub fn completion() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_elapsed: Some(Duration::from_secs(30)),
        }
    }

    /// Delay before the retry with 0-based index `retry`.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// The last error of a retried operation, with the number of attempts made.
#[derive(Debug)]
pub struct RetryError<E> {
    /// Error returned by the final attempt.
    pub error: E,
    /// Attempts made before giving up.
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted.
///
/// `is_retryable` decides per error whether another attempt is allowed.
/// `label` only appears in log output.
///
/// # Errors
///
/// Returns [`RetryError`] wrapping the last error.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use critic_review::retry::{retry, RetryPolicy};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let policy = RetryPolicy {
///     max_attempts: 3,
///     initial_backoff: Duration::from_millis(1),
///     max_elapsed: None,
/// };
/// let mut calls = 0;
/// let result: Result<u32, _> = rt.block_on(retry(&policy, "demo", |_: &String| true, || {
///     calls += 1;
///     let n = calls;
///     async move { if n < 2 { Err("flaky".to_string()) } else { Ok(n) } }
/// }));
/// assert_eq!(result.unwrap(), 2);
/// ```
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempts >= max_attempts || !is_retryable(&error) {
            return Err(RetryError { error, attempts });
        }

        let delay = policy.backoff(attempts - 1);
        if let Some(budget) = policy.max_elapsed {
            if started.elapsed() + delay > budget {
                tracing::warn!(
                    label,
                    attempts,
                    "retry budget of {}s exhausted",
                    budget.as_secs()
                );
                return Err(RetryError { error, attempts });
            }
        }

        tracing::warn!(
            label,
            attempt = attempts,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "{error}; retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
