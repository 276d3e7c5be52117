use crate::error_code::BackendErrorKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Component that raised the error (e.g., "resilient_invoker", "gemini_backend")
    pub source: Option<String>,
    /// Additional free-form detail (e.g., the offending config key)
    pub details: Option<String>,
    /// HTTP status reported by the backend, when there was one
    pub status_code: Option<u16>,
    /// Number of backend attempts made before giving up
    pub attempts: Option<u32>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// Unified error type for the conversation protocol layer.
///
/// Decoding never produces an error: malformed backend text degrades to a
/// fallback record. Everything here comes from the backend call, the memory
/// store or configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Backend returned an empty reply{}", format_context(.context))]
    EmptyReply { context: ErrorContext },

    #[error("Backend quota exceeded: {message}{}", format_context(.context))]
    QuotaExceeded {
        message: String,
        context: ErrorContext,
    },

    #[error("Backend rate limited: {message}{}", format_context(.context))]
    RateLimited {
        message: String,
        context: ErrorContext,
    },

    #[error("Backend error: {message}{}", format_context(.context))]
    Backend {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(status) = ctx.status_code {
        parts.push(format!("status: {}", status));
    }
    if let Some(attempts) = ctx.attempts {
        parts.push(format!("attempts: {}", attempts));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Build the error that corresponds to a classified backend failure.
    pub fn from_kind(kind: BackendErrorKind, message: impl Into<String>, context: ErrorContext) -> Self {
        let message = message.into();
        match kind {
            BackendErrorKind::RateLimited => Error::RateLimited { message, context },
            BackendErrorKind::QuotaExceeded => Error::QuotaExceeded { message, context },
            BackendErrorKind::EmptyReply => Error::EmptyReply { context },
            BackendErrorKind::Other => Error::Backend { message, context },
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new().with_source("config"),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Classification of this error for retry and presentation purposes.
    ///
    /// Failures outside the backend call (I/O on the memory store, bad config)
    /// fall into [`BackendErrorKind::Other`].
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Error::EmptyReply { .. } => BackendErrorKind::EmptyReply,
            Error::QuotaExceeded { .. } => BackendErrorKind::QuotaExceeded,
            Error::RateLimited { .. } => BackendErrorKind::RateLimited,
            _ => BackendErrorKind::Other,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().retryable()
    }

    /// Text the presentation layer shows instead of the raw error.
    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::EmptyReply { context }
            | Error::QuotaExceeded { context, .. }
            | Error::RateLimited { context, .. }
            | Error::Backend { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
