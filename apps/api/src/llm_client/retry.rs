//! Bounded retry combinator.
//!
//! Re-runs an async operation until it succeeds or `max_attempts` is reached.
//! There is no delay between attempts. On exhaustion the caller gets the last
//! error plus a rendered history of every failure.

use std::fmt;
use std::future::Future;

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
}

impl RetryPolicy {
    /// One initial attempt plus one retry.
    pub const DEFAULT_ATTEMPTS: usize = 2;

    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Runs `f` with the 1-based attempt number.
    pub async fn run<F, Fut, T, E>(&self, operation: &str, mut f: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut history = Vec::with_capacity(self.max_attempts);

        for attempt in 1..=self.max_attempts {
            match f(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempts = attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Operation attempt failed"
                    );
                    history.push(e.to_string());
                    if attempt == self.max_attempts {
                        return Err(RetryExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last_error: e,
                            history,
                        });
                    }
                }
            }
        }

        unreachable!("max_attempts is at least 1")
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS)
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub operation: String,
    pub attempts: usize,
    pub last_error: E,
    /// One rendered error per attempt, oldest first.
    pub history: Vec<String>,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.operation, self.attempts, self.last_error
        )
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryExhausted<E> {}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test]
    async fn test_first_attempt_success() {
        let calls = Cell::new(0);
        let result: Result<u32, RetryExhausted<String>> = RetryPolicy::default()
            .run("op", |_| {
                calls.set(calls.get() + 1);
                async { Ok(7) }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let result: Result<usize, RetryExhausted<String>> = RetryPolicy::default()
            .run("op", |attempt| async move {
                if attempt == 1 {
                    Err("boom".to_string())
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_history() {
        let result: Result<(), RetryExhausted<String>> = RetryPolicy::default()
            .run("extract", |attempt| async move { Err(format!("fail {attempt}")) })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last_error, "fail 2");
        assert_eq!(err.history, vec!["fail 1", "fail 2"]);
        assert_eq!(err.to_string(), "extract failed after 2 attempt(s): fail 2");
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }
}
