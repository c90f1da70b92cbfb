//! Exponential backoff for index requests
//!
//! Every failure is retried: the delay doubles from `base` on each attempt,
//! is capped at `max_delay`, and the last error is surfaced once `max_tries`
//! attempts have been made.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::config::Settings;
use crate::domain::errors::QueryError;

#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    max_tries: u32,
    base: Duration,
    max_delay: Duration,
}

impl Backoff {
    pub fn new(max_tries: u32, base: Duration, max_delay: Duration) -> Self {
        Self {
            max_tries: max_tries.max(1),
            base,
            max_delay,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.backoff_max_tries,
            settings.backoff_base(),
            settings.backoff_max_value(),
        )
    }

    /// Delay after the `attempt`-th failure (1-based): base * 2^(attempt-1), capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max_delay)
    }

    #[allow(dead_code)]
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    pub async fn retry<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if attempt >= self.max_tries => {
                    tracing::error!("{} failed after {} attempt(s): {}", label, attempt, err);
                    if attempt == 1 {
                        return Err(err);
                    }
                    return Err(QueryError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        label,
                        attempt,
                        self.max_tries,
                        err,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
