//! Exponential backoff
//!
//! Delay schedule used between SDK load attempts.

use crate::constants::{RETRY_INITIAL_DELAY_MS, RETRY_MAX_DELAY_MS, RETRY_MULTIPLIER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff configuration for retries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied per retry
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            multiplier: RETRY_MULTIPLIER,
        }
    }
}

impl BackoffConfig {
    /// Retry immediately, no waiting between attempts
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_delay.as_millis() as f64 * self.multiplier.powi((retry - 1) as i32);
        let capped = base.min(self.max_delay.as_millis() as f64).max(0.0);

        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_caps() {
        let config = BackoffConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            multiplier: 2.0,
        };
        assert_eq!(config.delay_for(0), Duration::ZERO);
        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(350));
        assert_eq!(config.delay_for(10), Duration::from_millis(350));
    }

    #[test]
    fn test_immediate_never_waits() {
        let config = BackoffConfig::immediate();
        assert_eq!(config.delay_for(1), Duration::ZERO);
        assert_eq!(config.delay_for(5), Duration::ZERO);
    }
}
