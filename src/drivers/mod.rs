//! 后端驱动抽象层：通过 trait 屏蔽具体文本生成服务的调用细节。
//!
//! Backend driver abstraction. The protocol layer only needs two things from
//! a text-generation service: open a session carrying the fixed instruction,
//! and send one turn on it.
//!
//! | Driver | Use |
//! |--------|-----|
//! | [`GeminiBackend`] | Google generateContent over HTTP |
//! | [`ScriptedBackend`] | Replays canned replies; records what was sent |

pub mod gemini;
pub mod scripted;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::session::{SessionConfig, SessionHandle};
use crate::types::RequestPayload;
use crate::Result;

pub use gemini::GeminiBackend;
pub use scripted::{ScriptedBackend, ScriptedReply, SentTurn};

/// A failed backend call, before classification.
///
/// The invoker classifies it by looking for markers in [`BackendFailure::dump`],
/// so everything the service reported is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendFailure {
    pub status: Option<u16>,
    pub message: String,
    pub body: Option<Value>,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Lower-cased message, status, and payload in one string.
    pub fn dump(&self) -> String {
        let mut out = self.message.to_lowercase();
        if let Some(status) = self.status {
            out.push_str(&format!(" status={}", status));
        }
        if let Some(body) = &self.body {
            out.push(' ');
            out.push_str(&body.to_string().to_lowercase());
        }
        out
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendFailure {}

/// A text-generation service the protocol layer can drive.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open a session configured with the system instruction and temperature.
    async fn open_session(&self, config: &SessionConfig) -> Result<SessionHandle>;

    /// Send one turn. `Ok(None)` means the service answered without any text.
    async fn send(
        &self,
        session: &mut SessionHandle,
        payload: &RequestPayload,
    ) -> std::result::Result<Option<String>, BackendFailure>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dump_includes_status_and_body() {
        let failure = BackendFailure::new("Too Many Requests")
            .with_status(429)
            .with_body(json!({"error": {"status": "RESOURCE_EXHAUSTED"}}));
        let dump = failure.dump();
        assert!(dump.contains("too many requests"));
        assert!(dump.contains("status=429"));
        assert!(dump.contains("resource_exhausted"));
        assert_eq!(failure.to_string(), "HTTP 429: Too Many Requests");
    }
}
