//! Error classification logic

use crate::error_code::BackendErrorKind;

/// Hard stops: no amount of waiting helps.
const QUOTA_MARKERS: &[&str] = &["quota", "billing"];

/// Transient throttling.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "429",
    "503",
    "resource_exhausted",
    "resource exhausted",
    "rate limit",
    "too many requests",
];

/// Classify a failure by the markers in its lower-cased dump.
///
/// Quota markers win over rate-limit markers: a 429 that mentions quota is
/// a quota stop. Substring matching can misfire on incidental digits; the
/// backend offers nothing more structured to match on.
pub fn classify_failure(dump: &str) -> BackendErrorKind {
    let dump = dump.to_lowercase();
    if QUOTA_MARKERS.iter().any(|m| dump.contains(m)) {
        BackendErrorKind::QuotaExceeded
    } else if RATE_LIMIT_MARKERS.iter().any(|m| dump.contains(m)) {
        BackendErrorKind::RateLimited
    } else {
        BackendErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_wins_over_rate_limit() {
        assert_eq!(
            classify_failure("status=429 You exceeded your current quota"),
            BackendErrorKind::QuotaExceeded
        );
        assert_eq!(classify_failure("Billing account disabled"), BackendErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_rate_limit_markers() {
        assert_eq!(classify_failure("status=503 overloaded"), BackendErrorKind::RateLimited);
        assert_eq!(classify_failure("RESOURCE_EXHAUSTED"), BackendErrorKind::RateLimited);
        assert_eq!(classify_failure("Too Many Requests"), BackendErrorKind::RateLimited);
    }

    #[test]
    fn test_other() {
        assert_eq!(classify_failure("status=400 invalid argument"), BackendErrorKind::Other);
        assert_eq!(classify_failure(""), BackendErrorKind::Other);
    }
}
