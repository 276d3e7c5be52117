use std::time::Duration;

use crate::config::RetryConfig;
use crate::error_code::BackendErrorKind;

/// How to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Bounded exponential backoff, applied to rate limiting only.
///
/// The n-th retry (counted from 1) waits `base_delay * 2^n`; with the default
/// one-second base that is 2s, 4s, 8s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
    }

    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide whether to make retry number `retry` after a `kind` failure.
    pub fn decide(&self, kind: BackendErrorKind, retry: u32) -> Decision {
        if kind.retryable() && retry <= self.max_retries {
            Decision::Retry {
                delay: self.backoff_delay(retry),
            }
        } else {
            Decision::Fail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<Decision> = (1..=4)
            .map(|n| policy.decide(BackendErrorKind::RateLimited, n))
            .collect();
        assert_eq!(
            delays,
            vec![
                Decision::Retry { delay: Duration::from_secs(2) },
                Decision::Retry { delay: Duration::from_secs(4) },
                Decision::Retry { delay: Duration::from_secs(8) },
                Decision::Fail,
            ]
        );
    }

    #[test]
    fn test_only_rate_limits_retry() {
        let policy = RetryPolicy::default();
        for kind in [
            BackendErrorKind::QuotaExceeded,
            BackendErrorKind::EmptyReply,
            BackendErrorKind::Other,
        ] {
            assert_eq!(policy.decide(kind, 1), Decision::Fail);
        }
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.decide(BackendErrorKind::RateLimited, 1), Decision::Fail);
    }
}
