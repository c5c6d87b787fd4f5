//! Retry policy: capped exponential backoff with optional jitter.

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use switchyard_core::ErrorKind;

/// Process-wide retry configuration.
///
/// Applied per candidate provider: a call retries against the same provider
/// while the attempt budget holds and the classified error kind is in the
/// retryable set, then the failover chain moves on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt (0 = single attempt).
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Scale each delay by a uniform factor in [0.5, 1.0].
    pub jitter: bool,
    /// Error kinds considered transient enough to retry.
    pub retryable: HashSet<ErrorKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
            retryable: HashSet::from([
                ErrorKind::RateLimit,
                ErrorKind::ServerError,
                ErrorKind::NetworkError,
                ErrorKind::Timeout,
            ]),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Backoff delay before re-attempting after the 0-based `attempt`.
    ///
    /// `min(max_delay, base_delay * multiplier^attempt)`, then jittered.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = raw.min(self.max_delay_ms as f64);
        let ms = if self.jitter && capped > 0.0 {
            capped * rand::thread_rng().gen_range(0.5..=1.0)
        } else {
            capped
        };
        Duration::from_millis(ms as u64)
    }

    /// Whether the failed 0-based `attempt` should be retried.
    pub fn should_retry(&self, attempt: u32, kind: ErrorKind) -> bool {
        attempt < self.max_retries && self.retryable.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> RetryConfig {
        RetryConfig {
            jitter: false,
            ..Default::default()
        }
    }

    #[test]
    fn delay_sequence_doubles_until_cap() {
        let config = no_jitter();
        let expected = [1_000, 2_000, 4_000, 8_000, 16_000];
        for (attempt, ms) in expected.iter().enumerate() {
            assert_eq!(
                config.delay_for(attempt as u32),
                Duration::from_millis(*ms),
                "attempt {attempt}"
            );
        }
        // Past the cap every delay flattens at max_delay.
        assert_eq!(config.delay_for(5), Duration::from_millis(30_000));
        assert_eq!(config.delay_for(12), Duration::from_millis(30_000));
    }

    #[test]
    fn jitter_stays_within_half_to_full_band() {
        let config = RetryConfig::default();
        for attempt in 0..8 {
            let unjittered = no_jitter().delay_for(attempt).as_millis() as f64;
            for _ in 0..50 {
                let delay = config.delay_for(attempt).as_millis() as f64;
                assert!(
                    delay >= unjittered * 0.5 - 1.0 && delay <= unjittered + 1.0,
                    "attempt {attempt}: {delay}ms outside [{}, {}]",
                    unjittered * 0.5,
                    unjittered
                );
            }
        }
    }

    #[test]
    fn retry_requires_budget_and_retryable_kind() {
        let config = RetryConfig::default();
        assert!(config.should_retry(0, ErrorKind::RateLimit));
        assert!(config.should_retry(2, ErrorKind::Timeout));
        // Budget exhausted.
        assert!(!config.should_retry(3, ErrorKind::Timeout));
        // Non-retryable kinds stop immediately regardless of budget.
        assert!(!config.should_retry(0, ErrorKind::Authentication));
        assert!(!config.should_retry(0, ErrorKind::InvalidRequest));
        assert!(!config.should_retry(0, ErrorKind::Unknown));
    }

    #[test]
    fn no_retry_policy_never_retries() {
        let config = RetryConfig::no_retry();
        assert!(!config.should_retry(0, ErrorKind::NetworkError));
    }
}
