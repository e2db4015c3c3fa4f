//! Sliding-window rate limiter for contact submissions.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SubmitRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl SubmitRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Record one attempt from `key` and report whether it is allowed, plus
    /// the remaining allowance inside the current window.
    pub fn allow(&self, key: &str) -> (bool, u32) {
        let now = Instant::now();
        let window = self.window;

        let mut entry = self.buckets.entry(key.to_string()).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let remaining = self.max_requests.saturating_sub(entry.len() as u32);
        if remaining == 0 {
            return (false, 0);
        }

        entry.push(now);
        // after push, one fewer slot remains
        (true, remaining.saturating_sub(1))
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = SubmitRateLimiter::new(Duration::from_secs(60), 5);
        for expected_remaining in (0..5).rev() {
            let (allowed, remaining) = limiter.allow("10.0.0.1");
            assert!(allowed);
            assert_eq!(remaining, expected_remaining);
        }
        let (allowed, remaining) = limiter.allow("10.0.0.1");
        assert!(!allowed);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn sources_are_limited_independently() {
        let limiter = SubmitRateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.allow("10.0.0.1").0);
        assert!(!limiter.allow("10.0.0.1").0);
        assert!(limiter.allow("10.0.0.2").0);
    }

    #[test]
    fn window_expiry_restores_the_allowance() {
        let limiter = SubmitRateLimiter::new(Duration::from_millis(20), 1);
        assert!(limiter.allow("10.0.0.1").0);
        assert!(!limiter.allow("10.0.0.1").0);
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.allow("10.0.0.1").0);
    }
}
