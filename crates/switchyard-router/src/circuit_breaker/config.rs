//! Circuit breaker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Process-wide circuit breaker configuration, applied to every provider's
/// breaker at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive terminal failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit blocks attempts before permitting a
    /// half-open probe.
    pub recovery_timeout: Duration,
    /// Minimum recorded outcomes before the circuit is allowed to trip.
    /// 0 disables the guard.
    pub minimum_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            minimum_requests: 0,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    pub fn with_minimum_requests(mut self, min: u32) -> Self {
        self.minimum_requests = min;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(30));
        assert_eq!(config.minimum_requests, 0);
    }

    #[test]
    fn builders_override_fields() {
        let config = CircuitBreakerConfig::default()
            .with_failure_threshold(2)
            .with_recovery_timeout(Duration::from_millis(50))
            .with_minimum_requests(10);
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.recovery_timeout, Duration::from_millis(50));
        assert_eq!(config.minimum_requests, 10);
    }
}
