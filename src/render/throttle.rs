//! Per-URL failure throttle.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Remembers recent failures so the same URL is declined for a while.
#[derive(Debug, Default)]
pub struct FailureThrottle {
    window: Duration,
    failures: DashMap<String, Instant>,
}

impl FailureThrottle {
    /// A zero window disables throttling.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            failures: DashMap::new(),
        }
    }

    /// Record a failure for `key`, dropping every entry whose window has passed.
    pub fn record_failure(&self, key: &str) {
        if self.window.is_zero() {
            return;
        }
        self.failures
            .retain(|_, failed_at| failed_at.elapsed() < self.window);
        self.failures.insert(key.to_string(), Instant::now());
    }

    /// Returns true if `key` failed within the window. Expired entries are evicted.
    pub fn is_throttled(&self, key: &str) -> bool {
        let expired = self
            .failures
            .get(key)
            .map(|failed_at| failed_at.elapsed() >= self.window);
        match expired {
            Some(true) => {
                self.failures.remove(key);
                false
            }
            Some(false) => true,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_window() {
        let throttle = FailureThrottle::new(Duration::from_secs(60));
        assert!(!throttle.is_throttled("https://example.com/"));

        throttle.record_failure("https://example.com/");
        assert!(throttle.is_throttled("https://example.com/"));
        assert!(!throttle.is_throttled("https://example.com/other"));
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let throttle = FailureThrottle::new(Duration::from_millis(1));
        throttle.record_failure("k");
        std::thread::sleep(Duration::from_millis(5));

        assert!(!throttle.is_throttled("k"));
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_expired_keys_are_dropped_on_record() {
        let throttle = FailureThrottle::new(Duration::from_millis(1));
        for i in 0..1000 {
            throttle.record_failure(&format!("https://example.com/page?v={}", i));
        }
        std::thread::sleep(Duration::from_millis(20));

        throttle.record_failure("https://example.com/last");
        assert!(throttle.len() <= 1);
    }

    #[test]
    fn test_zero_window_disables() {
        let throttle = FailureThrottle::new(Duration::ZERO);
        throttle.record_failure("k");
        assert!(!throttle.is_throttled("k"));
    }
}
