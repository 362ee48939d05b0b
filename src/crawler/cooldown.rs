//! Process-wide politeness throttle
//!
//! A single fixed spacing between page fetches, shared by every clone. This
//! is not a token bucket: there is no burst capacity.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Shared minimum spacing between successive fetches
///
/// The spacing runs from the end of one fetch to the start of the next.
/// Clones share the same clock, so crawl and download workers holding
/// different clones still observe one global delay.
#[derive(Debug, Clone)]
pub struct Cooldown {
    delay: Duration,
    last: Arc<Mutex<Option<Instant>>>,
}

/// Exclusive right to fetch; the clock restarts when it is dropped
#[derive(Debug)]
pub struct CooldownSlot {
    finished: OwnedMutexGuard<Option<Instant>>,
}

impl Drop for CooldownSlot {
    fn drop(&mut self) {
        *self.finished = Some(Instant::now());
    }
}

impl Cooldown {
    /// Creates a throttle with the given spacing
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until at least `delay` has passed since the previous slot was released
    ///
    /// Other callers queue behind the returned slot until it is dropped, so
    /// hold it for the whole fetch, retries included. The first call
    /// returns immediately.
    pub async fn wait(&self) -> CooldownSlot {
        let last = Arc::clone(&self.last).lock_owned().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            let now = Instant::now();
            if ready_at > now {
                tracing::trace!("Cooling down for {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        CooldownSlot { finished: last }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let cooldown = Cooldown::new(Duration::from_secs(60));
        let start = Instant::now();
        cooldown.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spacing_between_calls() {
        let cooldown = Cooldown::new(Duration::from_millis(50));
        let start = Instant::now();
        cooldown.wait().await;
        cooldown.wait().await;
        cooldown.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_clones_share_the_clock() {
        let cooldown = Cooldown::new(Duration::from_millis(50));
        let other = cooldown.clone();
        let start = Instant::now();
        cooldown.wait().await;
        other.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_spacing_counts_from_slot_release() {
        let cooldown = Cooldown::new(Duration::from_millis(50));
        let start = Instant::now();
        {
            let _slot = cooldown.wait().await;
            tokio::time::sleep(Duration::from_millis(80)).await;
        }
        cooldown.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(130));
    }

    #[tokio::test]
    async fn test_zero_delay_never_sleeps() {
        let cooldown = Cooldown::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            cooldown.wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
