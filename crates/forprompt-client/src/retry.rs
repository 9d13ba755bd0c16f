//! Retry policy for prompt fetches.

use std::future::Future;
use std::time::Duration;

use forprompt_core::{Error, Result};

use crate::TRACING_TARGET_EXECUTOR;

/// Exponential backoff with jitter.
///
/// Before retry `n` (counting from zero) the policy waits
/// `min(base * 2^n + jitter, max_backoff)`, where `jitter` is drawn
/// uniformly from `[0, max_jitter)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub attempts: u32,
    /// Backoff before the first retry, without jitter.
    pub base_backoff: Duration,
    /// Upper bound for any single backoff.
    pub max_backoff: Duration,
    /// Upper bound (exclusive) for the random jitter.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RETRIES)
    }
}

impl RetryPolicy {
    /// Creates a policy with the given total number of attempts.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            max_jitter: Duration::from_millis(500),
        }
    }

    /// Returns the backoff before retry `attempt`, with fresh jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_with_jitter(attempt, rand::random::<f64>())
    }

    /// Returns the backoff before retry `attempt` for a jitter fraction in
    /// `[0, 1)`.
    pub fn backoff_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.min(30) as i32;
        let secs = self.base_backoff.as_secs_f64() * 2f64.powi(exponent)
            + self.max_jitter.as_secs_f64() * jitter.clamp(0.0, 1.0);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out.
    ///
    /// Only `SERVER_ERROR` and `NETWORK_ERROR` are retried. When the attempts
    /// run out, the last retryable error is returned; `RETRY_EXHAUSTED` is
    /// returned only if no attempt ran.
    pub async fn retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.attempts {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => {
                    tracing::debug!(
                        target: TRACING_TARGET_EXECUTOR,
                        error = %err,
                        "Non-retryable error, failing immediately"
                    );
                    return Err(err);
                }
                Err(err) => {
                    // No sleep after the final attempt.
                    if attempt + 1 < self.attempts {
                        let backoff = self.backoff(attempt);
                        tracing::debug!(
                            target: TRACING_TARGET_EXECUTOR,
                            attempt = attempt + 1,
                            attempts = self.attempts,
                            backoff_ms = backoff.as_millis(),
                            error = %err,
                            "Retrying after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let err = last_error.unwrap_or_else(Error::retry_exhausted);
        tracing::warn!(
            target: TRACING_TARGET_EXECUTOR,
            attempts = self.attempts,
            error = %err,
            "Request failed after retries"
        );
        Err(err)
    }
}
