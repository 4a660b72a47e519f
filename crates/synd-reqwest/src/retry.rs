//! Retry policy for transient data-path failures.

use std::time::Duration;

use crate::{Error, Result, TRACING_TARGET_HTTP};

/// Exponential-backoff retry policy.
///
/// Applied to data-path requests (enriched-content reads, store writes);
/// health probes and policy queries run single-shot.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry attempts after the initial call (0 disables retrying).
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single backoff.
    pub max_backoff: Duration,
    /// Multiplier applied per attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            ..Self::default()
        }
    }

    /// Disables retrying.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let millis =
            (self.initial_backoff.as_millis() as f64) * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(millis as u64).min(self.max_backoff)
    }

    /// Runs `operation`, retrying retryable failures with exponential
    /// backoff until the attempt budget is spent.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    last_error = Some(err);
                    if attempt < self.max_attempts {
                        let backoff = self.backoff(attempt);
                        tracing::debug!(
                            target: TRACING_TARGET_HTTP,
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            backoff_ms = backoff.as_millis(),
                            "Retrying request after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::invalid_config("retry budget misconfigured")))
    }
}
