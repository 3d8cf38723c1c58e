//! Retry timing
//!
//! Failed exports are retried forever. The delay grows geometrically from
//! the initial backoff up to the configured ceiling and resets after the
//! next success. Decode failures use a fixed delay instead.

use std::time::Duration;

use exporter_config::DirectorConfig;

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DirectorConfig) -> Self {
        Self {
            initial: config.retry_initial_backoff(),
            max: config.retry_max_backoff(),
            multiplier: config.retry_multiplier,
        }
    }

    /// Delay before retry number `attempt` (0-based), capped at `max`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let millis = self.initial.as_millis() as f64 * factor;
        let max = self.max.as_millis() as f64;
        if !millis.is_finite() || millis >= max {
            self.max
        } else {
            Duration::from_millis(millis as u64)
        }
    }
}

/// Backoff state of the record currently being retried
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay for the next retry; grows with each call
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.policy.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(6), Duration::from_millis(6400));
        assert_eq!(policy.delay(7), Duration::from_secs(10));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_multiplier_below_one_is_constant() {
        let policy = RetryPolicy {
            initial: Duration::from_millis(50),
            max: Duration::from_secs(1),
            multiplier: 0.5,
        };
        assert_eq!(policy.delay(0), Duration::from_millis(50));
        assert_eq!(policy.delay(5), Duration::from_millis(50));
    }

    #[test]
    fn test_from_config() {
        let config = DirectorConfig {
            retry_initial_backoff_ms: 10,
            retry_max_backoff_ms: 30,
            retry_multiplier: 3.0,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(1), Duration::from_millis(30));
        assert_eq!(policy.delay(2), Duration::from_millis(30));
    }

    #[test]
    fn test_backoff_resets() {
        let mut backoff = Backoff::new(RetryPolicy::default());
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.attempt(), 2);
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
