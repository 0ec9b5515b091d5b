//! Cross-cutting retry policy
//!
//! Every network operation in the bot runs under one of two profiles:
//!
//! - **Unbounded-patient** for read-only bootstrap calls (catalog,
//!   vaccination list). A failure there is a backend-outage signal; the
//!   operation cannot proceed without success, so it retries indefinitely
//!   with a long fixed delay.
//! - **Bounded-immediate** for steady-state calls (login, search, cookie
//!   refresh). A failure there is a session-health signal; the call fails
//!   fast after a few short-spaced attempts so the state machine can
//!   escalate to session re-establishment instead of looping silently.
//!
//! The policy is a plain value injected into each call site, so both
//! profiles stay distinguishable and independently testable.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// A retry policy: attempt bound and fixed inter-attempt delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
    delay: Duration,
}

impl RetryPolicy {
    /// Retry indefinitely with a fixed delay between attempts
    pub fn unbounded_patient(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    /// Retry up to `attempts` times with a short fixed delay, then give
    /// the last error back to the caller
    pub fn bounded_immediate(attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
            delay,
        }
    }

    /// The configured inter-attempt delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `attempt_fn` until it succeeds or the attempt bound is hit.
    ///
    /// Each failure is logged as a warning with the operation name; the
    /// delay is applied between attempts, not after the last one.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if let Some(max) = self.max_attempts
                        && attempt >= max
                    {
                        tracing::warn!("{} failed after {} attempts: {}", operation, attempt, err);
                        return Err(err);
                    }
                    tracing::warn!(
                        "{} failed (attempt {}): {}; retrying in {:?}",
                        operation,
                        attempt,
                        err,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
