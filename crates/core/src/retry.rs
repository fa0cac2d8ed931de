//! Retry policy for re-establishing live subscriptions
//!
//! By default the live map retries a failed subscription after a fixed delay,
//! forever, until it succeeds or the view is torn down. `[sync]` can switch
//! on exponential backoff and a limit on consecutive failures.
//!
//! # Example
//!
//! ```rust
//! use pinmap_core::retry::RetryConfig;
//! use std::time::Duration;
//!
//! let policy = RetryConfig::fixed(Duration::from_secs(2));
//! assert!(policy.allows_attempt(1_000));
//! assert_eq!(policy.delay_for_attempt(7), Duration::from_secs(2));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, `None` for unbounded
    pub max_attempts: Option<u32>,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt; 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

impl RetryConfig {
    /// Same delay before every retry, no attempt limit
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay growing by `multiplier` per attempt, capped at `max_delay`, no attempt limit
    pub fn exponential(initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: None,
            initial_delay,
            max_delay: max_delay.max(initial_delay),
            backoff_multiplier: multiplier,
        }
    }

    /// Limit the number of attempts
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether attempt number `attempt` (0-based) may run
    pub fn allows_attempt(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }

    /// Calculate delay before a given attempt (0-based; the first attempt waits nothing)
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = (attempt - 1).min(i32::MAX as u32) as i32;
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        if !base_delay.is_finite() || base_delay >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        Duration::from_secs_f64(base_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_is_unbounded() {
        let config = RetryConfig::fixed(Duration::from_millis(2000));
        assert!(config.allows_attempt(0));
        assert!(config.allows_attempt(u32::MAX));
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(50), Duration::from_secs(2));
    }

    #[test]
    fn test_bounded_attempts() {
        let config = RetryConfig::fixed(Duration::from_millis(10)).with_max_attempts(3);
        assert!(config.allows_attempt(2));
        assert!(!config.allows_attempt(3));
    }

    #[test]
    fn test_delay_calculation() {
        let config =
            RetryConfig::exponential(Duration::from_millis(100), Duration::from_millis(350), 2.0);
        assert!(config.allows_attempt(1_000));

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(30), Duration::from_millis(350));
    }

    #[test]
    fn test_cap_below_initial_delay_is_raised() {
        let config =
            RetryConfig::exponential(Duration::from_secs(5), Duration::from_secs(1), 3.0);
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(5));
    }

    proptest::proptest! {
        #[test]
        fn prop_delay_never_exceeds_cap(
            attempt in 0u32..10_000,
            initial_ms in 1u64..5_000,
            extra_ms in 0u64..60_000,
        ) {
            let max = Duration::from_millis(initial_ms + extra_ms);
            let config = RetryConfig::exponential(Duration::from_millis(initial_ms), max, 2.0);
            proptest::prop_assert!(config.delay_for_attempt(attempt) <= max);
        }
    }
}
