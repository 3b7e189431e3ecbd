//! Per-connection sliding-window rate limiting for message sends.

use std::collections::HashMap;

/// Length of the sliding window in milliseconds.
pub const RATE_LIMIT_WINDOW_MILLIS: i64 = 1_000;
/// Maximum number of sends admitted within one window.
pub const RATE_LIMIT_MAX_MESSAGES: usize = 5;

/// Sliding-window counter keyed by connection id.
///
/// Each connection keeps the timestamps of its recent sends; timestamps older
/// than the window are pruned lazily on every check. This is deliberately a
/// sliding-window counter and not a token bucket: a burst straddling the
/// window boundary can momentarily exceed the per-second maximum, which is
/// accepted behavior.
pub struct RateLimiter {
    window_millis: i64,
    max_in_window: usize,
    windows: HashMap<String, Vec<i64>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(RATE_LIMIT_WINDOW_MILLIS, RATE_LIMIT_MAX_MESSAGES)
    }

    pub fn with_limits(window_millis: i64, max_in_window: usize) -> Self {
        Self {
            window_millis,
            max_in_window,
            windows: HashMap::new(),
        }
    }

    /// Check whether a send from `connection_id` at time `now` is limited.
    ///
    /// Returns `true` (limited) when the connection already has the maximum
    /// number of sends inside the window; the attempt is NOT recorded in that
    /// case. Otherwise records `now` and returns `false`.
    pub fn is_limited(&mut self, connection_id: &str, now: i64) -> bool {
        let timestamps = self.windows.entry(connection_id.to_string()).or_default();
        timestamps.retain(|t| now - t < self.window_millis);

        if timestamps.len() >= self.max_in_window {
            return true;
        }

        timestamps.push(now);
        false
    }

    /// Drop all state for a disconnected connection.
    pub fn forget(&mut self, connection_id: &str) {
        self.windows.remove(connection_id);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_maximum_within_one_window() {
        let mut limiter = RateLimiter::new();
        for i in 0..5 {
            assert!(!limiter.is_limited("c1", 1_000 + i * 40));
        }
    }

    #[test]
    fn limits_the_sixth_send_in_the_same_window() {
        let mut limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(!limiter.is_limited("c1", 1_000));
        }
        assert!(limiter.is_limited("c1", 1_200));
    }

    #[test]
    fn limited_attempts_are_not_recorded() {
        let mut limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.is_limited("c1", 1_000);
        }
        // Hammering while limited must not extend the window.
        for _ in 0..10 {
            assert!(limiter.is_limited("c1", 1_500));
        }
        // The original five expire at 2_000; a send then goes through.
        assert!(!limiter.is_limited("c1", 2_100));
    }

    #[test]
    fn admits_again_after_the_window_expires() {
        let mut limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(!limiter.is_limited("c1", 1_000));
        }
        assert!(limiter.is_limited("c1", 1_900));
        assert!(!limiter.is_limited("c1", 2_100));
    }

    #[test]
    fn connections_are_limited_independently() {
        let mut limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(!limiter.is_limited("c1", 1_000));
        }
        assert!(limiter.is_limited("c1", 1_000));
        assert!(!limiter.is_limited("c2", 1_000));
    }

    #[test]
    fn forget_resets_the_window() {
        let mut limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.is_limited("c1", 1_000);
        }
        assert!(limiter.is_limited("c1", 1_000));

        limiter.forget("c1");
        assert!(!limiter.is_limited("c1", 1_000));
    }
}
