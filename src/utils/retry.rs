//! Retry-with-backoff for fallible async operations.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

/// How the pause between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `unit * attempt`
    Linear(Duration),
    /// `unit * attempt²`
    Quadratic(Duration),
}

impl Backoff {
    /// Delay after the given failed attempt (1-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Backoff::Linear(unit) => unit.saturating_mul(attempt),
            Backoff::Quadratic(unit) => unit.saturating_mul(attempt.saturating_mul(attempt)),
        }
    }
}

/// Number of attempts and the pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Three attempts with 1s, then 4s between them.
    pub fn quadratic() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Quadratic(Duration::from_secs(1)),
        }
    }

    /// `max_attempts` attempts with 1s, 2s, 3s, ... between them.
    pub fn linear(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear(Duration::from_secs(1)),
        }
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// There is no pause after the final attempt. Exhaustion is reported as
    /// [`AppError::RetriesExhausted`] wrapping the last error.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= attempts => {
                    return Err(AppError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts,
                        source: Box::new(error),
                    });
                }
                Err(error) => {
                    log::warn!(
                        "{} failed (attempt {}/{}): {}, retrying",
                        operation,
                        attempt,
                        attempts,
                        error
                    );
                    tokio::time::sleep(self.backoff.delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
