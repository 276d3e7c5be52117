use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation mode of a single turn.
///
/// Decided fresh for every user turn; never stored beyond the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    Greeting,
    Diagnostic,
    Unlock,
    Idle,
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Diagnostic => "diagnostic",
            Self::Unlock => "unlock",
            Self::Idle => "idle",
        }
    }

    #[inline]
    pub fn is_unlock(&self) -> bool {
        matches!(self, Self::Unlock)
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
