//! 模式识别：根据用户输入与会话位置判定本轮会话模式。
//!
//! Mode classification.
//!
//! Rules, in priority order:
//! 1. Input byte-identical (after trimming) to [`UNLOCK_PHRASE`] → Unlock.
//! 2. Trimmed, case-insensitive idle keyword → Idle.
//! 3. First turn with no log text, error text, robot model or image → Greeting.
//! 4. Everything else → Diagnostic.
//!
//! Only user-authored text may be passed here. Backend output is never
//! re-classified, so an echoed unlock phrase can never unlock anything.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::protocol::UNLOCK_PHRASE;
use crate::types::ConversationMode;

pub const IDLE_KEYWORDS: &[&str] = &["ok", "thanks", "exit", "close"];

static ERROR_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:errors?|err|faults?|fatal|warn(?:ing)?s?|exceptions?|failed|failures?|timeout|timed out|collisions?|alarms?|abort(?:ed)?|e-?stop|panic(?:ked)?|traceback|overcurrent|overheat(?:ing)?|singular(?:ity)?|joint limit)\b",
    )
    .expect("error text pattern is valid")
});

static LOG_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)(?:^\s*\[?(?:INFO|WARN|WARNING|ERROR|DEBUG|FATAL)\]?[\s:\]]|\b\d{1,2}:\d{2}:\d{2}\b|\[\s*\d+\.\d+\s*\]|/joint_states|/tf\b|\brad/s\b|\bros2?\b|\bmoveit2?\b)",
    )
    .expect("log text pattern is valid")
});

static ROBOT_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:kuka|kr\s?\d+|abb|irb\s?\d+|fanuc|yaskawa|motoman|ur(?:3|5|10|16|20|30)e?|universal robots|kawasaki|denso|st(?:a|ä)ubli|franka|panda|epson|nachi|comau|doosan|techman|xarm|kinova)\b",
    )
    .expect("robot model pattern is valid")
});

/// Non-textual facts about a turn that bear on classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnSignals {
    pub has_image: bool,
    pub has_robot_model: bool,
}

/// Rule-based, backend-free mode classifier.
#[derive(Debug, Clone, Default)]
pub struct ModeClassifier;

impl ModeClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(
        &self,
        message: &str,
        is_first_turn: bool,
        signals: TurnSignals,
    ) -> ConversationMode {
        let mode = if is_unlock_command(message) {
            ConversationMode::Unlock
        } else if is_idle_keyword(message) {
            ConversationMode::Idle
        } else if is_first_turn && !signals.has_image && !signals.has_robot_model && !carries_diagnostic_input(message) {
            ConversationMode::Greeting
        } else {
            ConversationMode::Diagnostic
        };
        debug!(mode = mode.as_str(), is_first_turn, has_image = signals.has_image, "classified turn");
        mode
    }
}

/// Classify a text-only turn.
pub fn classify(message: &str, is_first_turn: bool) -> ConversationMode {
    ModeClassifier::new().classify(message, is_first_turn, TurnSignals::default())
}

/// Exact match only: prefixes, supersets and punctuation variants do not count.
pub fn is_unlock_command(message: &str) -> bool {
    message.trim() == UNLOCK_PHRASE
}

pub fn is_idle_keyword(message: &str) -> bool {
    let lowered = message.trim().to_lowercase();
    IDLE_KEYWORDS.contains(&lowered.as_str())
}

/// Whether the text carries log lines, error text or a robot model identifier.
pub fn carries_diagnostic_input(message: &str) -> bool {
    ERROR_TEXT.is_match(message) || LOG_TEXT.is_match(message) || ROBOT_MODEL.is_match(message)
}
