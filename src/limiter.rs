//! Shared rate limiting for text-generation calls
//!
//! Bounds concurrent calls with a semaphore and enforces a minimum spacing
//! between call starts, sized to the backend's quota. Replaces fixed
//! inter-step sleeps; tests run unthrottled.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::Instant;
use tracing::debug;

pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// No spacing, effectively unbounded concurrency. For tests and demos.
    pub fn unthrottled() -> Self {
        Self::new(64, Duration::ZERO)
    }

    /// Wait for a concurrency permit and this call's start slot. The permit
    /// is held for the duration of the guarded call.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("rate limiter semaphore closed");

        if !self.min_interval.is_zero() {
            let wait_until = {
                let mut slot = self.next_slot.lock().await;
                let now = Instant::now();
                let start = match *slot {
                    Some(t) if t > now => t,
                    _ => now,
                };
                *slot = Some(start + self.min_interval);
                start
            };

            if wait_until > Instant::now() {
                debug!(
                    wait_ms = (wait_until - Instant::now()).as_millis() as u64,
                    "Pacing text-generation call"
                );
            }
            tokio::time::sleep_until(wait_until).await;
        }

        permit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unthrottled_acquires_immediately() {
        let limiter = RateLimiter::unthrottled();
        let started = Instant::now();
        let _permit = limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_spacing_between_calls() {
        let limiter = RateLimiter::new(4, Duration::from_millis(60));

        let started = Instant::now();
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);

        // Second and third acquisitions are each pushed one interval later.
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let limiter = RateLimiter::new(1, Duration::ZERO);
        let first = limiter.acquire().await;
        assert_eq!(limiter.semaphore.available_permits(), 0);
        drop(first);
        assert_eq!(limiter.semaphore.available_permits(), 1);
    }
}
