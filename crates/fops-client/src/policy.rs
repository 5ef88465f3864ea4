//! Retry policy: which failures are retried, how often, and how long to wait.

use std::time::Duration;

/// HTTP statuses treated as transient.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Delay formula between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// `base_delay * n` before retry n. Uncapped.
    #[default]
    Linear,
    /// `base_delay * 2^(n-1)`, capped at `max_delay`.
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt; total attempts = `1 + max_retries`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
    /// Only consulted by [`Backoff::Exponential`].
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(1_000),
            backoff: Backoff::Linear,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries; useful for diagnostics.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `n` (1-indexed: `n = 1` is the second attempt).
    pub fn delay_before_retry(&self, n: u32) -> Duration {
        let n = n.max(1);
        match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(n),
            Backoff::Exponential => {
                let factor = 2u32.checked_pow(n - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parity_behavior() {
        let p = RetryPolicy::default();
        assert_eq!(p.timeout, Duration::from_secs(30));
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.max_attempts(), 4);
        assert_eq!(p.backoff, Backoff::Linear);
    }

    #[test]
    fn linear_delay_is_base_times_n() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_before_retry(1), Duration::from_millis(1_000));
        assert_eq!(p.delay_before_retry(2), Duration::from_millis(2_000));
        assert_eq!(p.delay_before_retry(3), Duration::from_millis(3_000));
    }

    #[test]
    fn exponential_delay_doubles_and_caps() {
        let p = RetryPolicy {
            backoff: Backoff::Exponential,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(3_000),
            ..RetryPolicy::default()
        };
        assert_eq!(p.delay_before_retry(1), Duration::from_millis(500));
        assert_eq!(p.delay_before_retry(2), Duration::from_millis(1_000));
        assert_eq!(p.delay_before_retry(3), Duration::from_millis(2_000));
        assert_eq!(p.delay_before_retry(4), Duration::from_millis(3_000));
        assert_eq!(p.delay_before_retry(40), Duration::from_millis(3_000));
    }

    #[test]
    fn retry_zero_is_treated_as_first_retry() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_before_retry(0), p.delay_before_retry(1));
    }

    #[test]
    fn retryable_status_set() {
        for s in RETRYABLE_STATUSES {
            assert!(is_retryable_status(s));
        }
        for s in [200u16, 400, 401, 403, 404, 501] {
            assert!(!is_retryable_status(s));
        }
    }
}
