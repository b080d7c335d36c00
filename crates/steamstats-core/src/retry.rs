//! Retry policy shared by every outbound request

use std::time::Duration;

/// Backoff configuration injected into [`Transport`](crate::Transport).
///
/// Two independent loops hang off this:
/// - rate limiting (`rate_limit_status`): retried until it clears, each wait
///   `rate_limit_step` longer than the previous one, optionally bounded
/// - server errors (`retryable_statuses`) and connection failures: at most
///   `max_attempts` requests, delay doubling from `base_delay`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retryable_statuses: Vec<u16>,
    pub rate_limit_status: u16,
    pub rate_limit_delay: Duration,
    pub rate_limit_step: Duration,
    /// `None` = wait out rate limiting indefinitely
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            retryable_statuses: vec![500, 502, 503, 504],
            rate_limit_status: 429,
            rate_limit_delay: Duration::from_secs(5),
            rate_limit_step: Duration::from_secs(5),
            max_rate_limit_retries: None,
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Delay after the `attempt`-th failed request (1-based): 2s, 4s, 8s, ...
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Delay after the `hit`-th rate-limited response (1-based): 5s, 10s, 15s, ...
    pub fn rate_limit_backoff(&self, hit: u32) -> Duration {
        self.rate_limit_delay
            .saturating_add(self.rate_limit_step.saturating_mul(hit.saturating_sub(1)))
    }

    /// Whether another rate-limit retry is allowed after `hits` 429s
    pub fn allows_rate_limit_retry(&self, hits: u32) -> bool {
        self.max_rate_limit_retries.map_or(true, |max| hits <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_duration(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_duration(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_duration(3), Duration::from_secs(8));
    }

    #[test]
    fn rate_limit_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_backoff(1), Duration::from_secs(5));
        assert_eq!(policy.rate_limit_backoff(2), Duration::from_secs(10));
        assert_eq!(policy.rate_limit_backoff(3), Duration::from_secs(15));
    }

    #[test]
    fn server_errors_retryable() {
        let policy = RetryPolicy::default();
        for status in [500, 502, 503, 504] {
            assert!(policy.is_retryable_status(status));
        }
        assert!(!policy.is_retryable_status(404));
        assert!(!policy.is_retryable_status(429));
    }

    #[test]
    fn unbounded_rate_limit_by_default() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_rate_limit_retry(10_000));
    }

    #[test]
    fn bounded_rate_limit() {
        let policy = RetryPolicy {
            max_rate_limit_retries: Some(2),
            ..Default::default()
        };
        assert!(policy.allows_rate_limit_retry(2));
        assert!(!policy.allows_rate_limit_retry(3));
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy::default();
        // Must not panic on absurd attempt counts
        let _ = policy.backoff_duration(200);
    }
}
