//! 后端错误分类码：区分配额耗尽、限流、空回复与其它失败。
//!
//! Backend failure classification.
//!
//! Every failed turn surfaces as exactly one [`BackendErrorKind`]. The kind
//! decides two things: whether the Resilient Invoker may retry, and which
//! message the presentation layer shows to the operator.
//!
//! | Code  | Name             | Retryable | Meaning                                   |
//! |-------|------------------|-----------|-------------------------------------------|
//! | E2001 | `rate_limited`   | yes       | Transient throttling (429/503, exhausted) |
//! | E2002 | `quota_exceeded` | no        | Hard billing / quota stop                 |
//! | E3004 | `empty_reply`    | no        | Backend answered with no text             |
//! | E9999 | `backend_error`  | no        | Anything else                             |
//!
//! ## Example
//!
//! ```rust
//! use roma_protocol::error_code::BackendErrorKind;
//!
//! let kind = BackendErrorKind::RateLimited;
//! assert_eq!(kind.code(), "E2001");
//! assert!(kind.retryable());
//! assert!(!BackendErrorKind::QuotaExceeded.retryable());
//! ```

use std::fmt;

/// Classified kind of a failed backend turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// E2001: transient throttling, worth a short bounded backoff
    RateLimited,
    /// E2002: billing or quota stop, no retry can help
    QuotaExceeded,
    /// E3004: the backend returned a reply without any text
    EmptyReply,
    /// E9999: unclassified failure
    Other,
}

impl BackendErrorKind {
    /// Returns the canonical code string (e.g., `"E2001"`).
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited => "E2001",
            Self::QuotaExceeded => "E2002",
            Self::EmptyReply => "E3004",
            Self::Other => "E9999",
        }
    }

    /// Returns the standard name (e.g., `"rate_limited"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::EmptyReply => "empty_reply",
            Self::Other => "backend_error",
        }
    }

    /// Only throttling is retried.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Operator-facing text for a turn that failed with this kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => "API Quota Exceeded. The free tier limit has been reached.",
            Self::RateLimited => "System Busy. Please try again in 30 seconds.",
            Self::EmptyReply | Self::Other => "Communication failed. Please try again.",
        }
    }

    /// Parses a standard name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rate_limited" => Some(Self::RateLimited),
            "quota_exceeded" => Some(Self::QuotaExceeded),
            "empty_reply" => Some(Self::EmptyReply),
            "backend_error" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BackendErrorKind; 4] = [
        BackendErrorKind::RateLimited,
        BackendErrorKind::QuotaExceeded,
        BackendErrorKind::EmptyReply,
        BackendErrorKind::Other,
    ];

    #[test]
    fn test_only_rate_limit_is_retryable() {
        let retryable: Vec<_> = ALL.iter().filter(|k| k.retryable()).collect();
        assert_eq!(retryable, vec![&BackendErrorKind::RateLimited]);
    }

    #[test]
    fn test_name_roundtrip() {
        for kind in ALL {
            assert_eq!(BackendErrorKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(BackendErrorKind::from_name("nope"), None);
    }

    #[test]
    fn test_user_messages() {
        assert!(BackendErrorKind::QuotaExceeded.user_message().contains("Quota"));
        assert!(BackendErrorKind::RateLimited.user_message().contains("Busy"));
        assert_eq!(
            BackendErrorKind::EmptyReply.user_message(),
            BackendErrorKind::Other.user_message()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BackendErrorKind::QuotaExceeded.to_string(),
            "E2002 (quota_exceeded)"
        );
    }
}
