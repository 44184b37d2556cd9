//! Retry strategies for sheet reads.
//!
//! Ordinary failures wait `multiplier^attempt` seconds; rate-limit
//! rejections wait `rate_limit_base + multiplier^attempt` seconds.
//! `attempt` counts from zero for the first retry.

use std::time::Duration;

use sheetsync_store::RetryConfig;

/// Strategy for retrying failed requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Base raised to the attempt number, in seconds.
    pub multiplier: u64,
    /// Constant added after a rate-limit rejection, in seconds.
    pub rate_limit_base_secs: u64,
    /// Maximum delay between retries, in seconds.
    pub max_delay_secs: u64,
}

impl RetryStrategy {
    /// Creates a strategy allowing `max_retries` extra attempts.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            multiplier: 2,
            rate_limit_base_secs: 5,
            max_delay_secs: 60,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Sets the rate-limit base delay.
    #[must_use]
    pub fn with_rate_limit_base(mut self, secs: u64) -> Self {
        self.rate_limit_base_secs = secs;
        self
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculates the wait before retry number `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: u32, rate_limited: bool) -> Duration {
        let backoff = self.multiplier.saturating_pow(attempt);
        let delay = if rate_limited {
            self.rate_limit_base_secs.saturating_add(backoff)
        } else {
            backoff
        };

        Duration::from_secs(delay.min(self.max_delay_secs))
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(2)
    }
}

impl From<&RetryConfig> for RetryStrategy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            multiplier: config.multiplier,
            rate_limit_base_secs: config.rate_limit_base_secs,
            max_delay_secs: config.max_delay_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::default();

        assert_eq!(strategy.delay_for_attempt(0, false), Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(1, false), Duration::from_secs(2));
        assert_eq!(strategy.delay_for_attempt(2, false), Duration::from_secs(4));
    }

    #[test]
    fn test_rate_limited_backoff_is_longer() {
        let strategy = RetryStrategy::default();

        assert_eq!(strategy.delay_for_attempt(0, true), Duration::from_secs(6));
        assert_eq!(strategy.delay_for_attempt(1, true), Duration::from_secs(7));
        assert!(strategy.delay_for_attempt(3, true) > strategy.delay_for_attempt(3, false));
    }

    #[test]
    fn test_max_delay_cap() {
        let strategy = RetryStrategy::new(10).with_rate_limit_base(30);

        assert_eq!(strategy.delay_for_attempt(6, false), Duration::from_secs(60));
        assert_eq!(strategy.delay_for_attempt(5, true), Duration::from_secs(60));
        assert_eq!(strategy.delay_for_attempt(200, false), Duration::from_secs(60));
    }

    #[test]
    fn test_from_config() {
        let strategy = RetryStrategy::from(&RetryConfig::default());
        assert_eq!(strategy, RetryStrategy::default());
        assert_eq!(strategy.max_attempts(), 3);
        assert_eq!(RetryStrategy::no_retry().max_attempts(), 1);
    }
}
