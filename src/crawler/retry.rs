//! Bounded retry with uniform random jitter
//!
//! Every fetch failure is retried the same way: up to `max_attempts` total
//! attempts, sleeping a random interval in `[0, max_jitter]` between them.
//! There is no exponential growth; the jitter only spreads requests out.

use crate::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry policy wrapped around a single fetch
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_jitter: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, max_jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            max_jitter,
        }
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Picks the wait before the next attempt
    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// Runs `operation` until it succeeds or the attempts are used up
    ///
    /// # Arguments
    ///
    /// * `url` - The URL being fetched, carried into the final error
    /// * `operation` - Produces a fresh attempt each time it is called
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful attempt
    /// * `Err(FetchError::Exhausted)` - Every attempt failed; wraps the last failure
    pub async fn run<F, Fut, T>(&self, url: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.jitter();
                    tracing::debug!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        url,
                        e,
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
