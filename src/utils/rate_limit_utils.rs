//! Request rate limiting
//!
//! A one-second fixed window. When the window's budget is spent the caller
//! is delayed by a fixed back-off and then let through, so the limiter
//! smooths bursts rather than rejecting requests.

use log::warn;
use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

const WINDOW: Duration = Duration::from_secs(1);

/// Delay applied when the budget for the current window is spent
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

/// Fixed-window limiter shared by all requests of one client
#[derive(Debug)]
pub struct RateLimiter {
    per_second: u32,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second: per_second.max(1),
            window: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn per_second(&self) -> u32 {
        self.per_second
    }

    /// Take one slot from the current window
    ///
    /// # Returns
    /// * `true` - A slot was free
    /// * `false` - The window is exhausted
    pub fn try_acquire(&self) -> bool {
        let mut window = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        if now.duration_since(window.started) >= WINDOW {
            window.started = now;
            window.used = 0;
        }
        if window.used < self.per_second {
            window.used += 1;
            true
        } else {
            false
        }
    }

    /// Wait for permission to send a request
    pub async fn acquire(&self) {
        if !self.try_acquire() {
            warn!("rate limit reached, sleep {}ms", RATE_LIMIT_BACKOFF.as_millis());
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_per_window() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.per_second(), 1);
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_never_blocks_forever() {
        let limiter = RateLimiter::new(1);
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= RATE_LIMIT_BACKOFF);
    }
}
