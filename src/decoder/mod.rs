//! 响应解码模块：将后端自由文本回复解析为强类型、可安全展示的诊断记录。
//!
//! # Response Decoder
//!
//! Turns the backend's free-form reply into a [`DiagnosticResult`]. Decoding
//! never fails: text without the expected structure degrades to a fallback
//! record, because a chat surface always needs something to show.
//!
//! | Mode | Path |
//! |------|------|
//! | `Unlock` | code-only grant, or a fixed denial when the sentinel is present |
//! | `Greeting`, `Diagnostic`, `Idle` | greeting detection, then nearest-next-boundary section scan |
//!
//! Outside a granted unlock, `recoveryCode` is always the sentinel no matter
//! what the backend wrote.
//!
//! ```rust
//! use roma_protocol::decoder::decode;
//! use roma_protocol::types::{ConversationMode, RiskLevel};
//!
//! let raw = "RISK_LEVEL: CRITICAL\nROOT_CAUSE:\nCollision on J4.\nRECOVERY_CODE:\nimport rclpy\nStanding by for next input.";
//! let result = decode(raw, ConversationMode::Diagnostic);
//! assert_eq!(result.metadata.risk_level, Some(RiskLevel::Critical));
//! assert_eq!(result.sections.recovery_code, "BLOCKED BY SAFETY GATE");
//! assert!(!result.metadata.code_allowed);
//! ```

mod diagnostic;
pub mod sections;
mod unlock;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::guardrails::OutputGuard;
use crate::types::{ConversationMode, DiagnosticResult};

static DEFAULT_DECODER: Lazy<ResponseDecoder> = Lazy::new(ResponseDecoder::default);

/// Decodes backend replies, scrubbing displayed sections through an
/// [`OutputGuard`].
#[derive(Debug, Clone, Default)]
pub struct ResponseDecoder {
    guard: OutputGuard,
}

impl ResponseDecoder {
    pub fn new(guard: OutputGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &OutputGuard {
        &self.guard
    }

    pub fn decode(&self, raw: &str, mode: ConversationMode) -> DiagnosticResult {
        let result = match mode {
            ConversationMode::Unlock => unlock::decode(raw, &self.guard),
            ConversationMode::Greeting | ConversationMode::Diagnostic | ConversationMode::Idle => {
                diagnostic::decode(raw, &self.guard)
            }
        };
        for violation in &result.violations {
            warn!(mode = %mode, violation = %violation, "Backend reply broke the reply layout");
        }
        result
    }
}

/// Decode with the default guard.
pub fn decode(raw: &str, mode: ConversationMode) -> DiagnosticResult {
    DEFAULT_DECODER.decode(raw, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BLOCKED_SENTINEL, UNLOCK_PHRASE};

    #[test]
    fn test_same_text_differs_by_mode() {
        let raw = "```bash\nros2 launch cell home.launch.py\n```";
        let diag = decode(raw, ConversationMode::Diagnostic);
        assert_eq!(diag.sections.recovery_code, BLOCKED_SENTINEL);
        assert!(!diag.metadata.code_allowed);

        let unlocked = decode(raw, ConversationMode::Unlock);
        assert!(unlocked.metadata.code_allowed);
        assert_eq!(unlocked.sections.recovery_code, "ros2 launch cell home.launch.py");
    }

    #[test]
    fn test_empty_text_decodes_to_empty_record() {
        let r = decode("   ", ConversationMode::Diagnostic);
        assert!(r.sections.root_cause.is_empty());
        assert_eq!(r.sections.recovery_code, BLOCKED_SENTINEL);
    }

    #[test]
    fn test_permissive_decoder_keeps_chrome() {
        let decoder = ResponseDecoder::new(OutputGuard::permissive());
        let raw = format!("ROOT_CAUSE:\nType this: {}", UNLOCK_PHRASE);
        let r = decoder.decode(&raw, ConversationMode::Diagnostic);
        assert!(r.sections.root_cause.contains(UNLOCK_PHRASE));
        assert!(r.violations.is_empty());
    }
}
