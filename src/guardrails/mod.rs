//! 输出防护模块：清除模型回复中泄漏的界面文字，识别诊断模式中的代码泄漏。
//!
//! # Output Guard
//!
//! The backend is told never to emit interface text and never to put code in
//! a diagnostic reply. It does not always comply, so every section shown to
//! the operator passes through an [`OutputGuard`] first.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`OutputGuard`] | Scrubs UI chrome and detects code-like content |
//! | [`KeywordFilter`] | Case-insensitive label removal |
//! | [`PatternFilter`] | Regex detection of code fragments |
//!
//! ```rust
//! use roma_protocol::guardrails::OutputGuard;
//!
//! let guard = OutputGuard::default();
//! let (clean, leaked) = guard.scrub("Check axis 2.\nCONFIRM SAFETY & UNLOCK");
//! assert_eq!(clean, "Check axis 2.");
//! assert_eq!(leaked, vec!["Confirm Safety & Unlock".to_string()]);
//! assert!(guard.looks_like_code("import rclpy\nrclpy.init()"));
//! ```

mod filters;

pub use filters::{ContentFilter, KeywordFilter, PatternFilter};

use crate::protocol::UNLOCK_PHRASE;

/// Interface labels that must never reach displayed content.
pub const UI_CHROME_LABELS: &[&str] = &[
    "Confirm Safety & Unlock",
    "You must confirm all safety checks to generate executable code.",
    "You must confirm all safety checks",
    "Click here",
    "Press button",
    "Type message",
    UNLOCK_PHRASE,
];

/// Fragments that mark executable content.
pub const CODE_PATTERNS: &[&str] = &[
    r"```",
    r"(?m)^\s*from\s+[A-Za-z_][\w.]*\s+import\s+\S",
    r"(?m)^\s*import\s+[A-Za-z_][\w.]*(?:\s+as\s+\w+)?\s*;?\s*$",
    r"#include\s*[<\x22]",
    r"(?m)^\s*def\s+\w+\s*\(",
    r"(?m)^\s*class\s+\w+\s*[(:]",
    r"(?m)^\s*(?:int|void)\s+main\s*\(",
    r"\brclpy\.",
    r"\bmoveit_(?:commander|py)\b",
    r"(?m)^\s*#!/",
];

/// Scrubs leaked interface text and spots code.
#[derive(Debug, Clone)]
pub struct OutputGuard {
    chrome: KeywordFilter,
    code: PatternFilter,
}

impl Default for OutputGuard {
    fn default() -> Self {
        Self::new(
            UI_CHROME_LABELS.iter().copied(),
            CODE_PATTERNS.iter().copied(),
        )
    }
}

impl OutputGuard {
    pub fn new<'a>(
        labels: impl IntoIterator<Item = &'a str>,
        code_patterns: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            chrome: KeywordFilter::from_keywords(labels),
            code: PatternFilter::from_patterns(code_patterns),
        }
    }

    /// A guard that lets everything through.
    pub fn permissive() -> Self {
        Self {
            chrome: KeywordFilter::new(),
            code: PatternFilter::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.chrome.add_keyword(label);
        self
    }

    /// Remove interface labels; returns the cleaned text and the labels found.
    pub fn scrub(&self, text: &str) -> (String, Vec<String>) {
        let leaked = self.chrome.check(text);
        if leaked.is_empty() {
            return (text.to_string(), leaked);
        }
        (self.chrome.scrub(text), leaked)
    }

    pub fn looks_like_code(&self, text: &str) -> bool {
        self.code.is_match(text)
    }

    /// Interface labels present in `text`, which is left as is.
    pub fn leaked_labels(&self, text: &str) -> Vec<String> {
        self.chrome.check(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_phrase_is_scrubbed() {
        let guard = OutputGuard::default();
        let (clean, leaked) = guard.scrub(&format!("Type:\n{}", UNLOCK_PHRASE));
        assert_eq!(clean, "Type:");
        assert_eq!(leaked, vec![UNLOCK_PHRASE.to_string()]);
    }

    #[test]
    fn test_code_detection() {
        let guard = OutputGuard::default();
        assert!(guard.looks_like_code("```python\nprint(1)\n```"));
        assert!(guard.looks_like_code("#include <moveit/move_group_interface.h>"));
        assert!(guard.looks_like_code("def recover():\n    pass"));
        assert!(!guard.looks_like_code("BLOCKED BY SAFETY GATE"));
        assert!(!guard.looks_like_code("Import the calibration file from the pendant."));
        assert!(guard.looks_like_code("from moveit.planning import MoveItPy"));
        assert!(guard.looks_like_code("import java.util.List;"));
        assert!(!guard.looks_like_code("from what you describe, axis 3 slips under load."));
        assert!(!guard.looks_like_code("import the backup from the pendant first"));
    }

    #[test]
    fn test_permissive_and_custom_labels() {
        let guard = OutputGuard::permissive().with_label("Copy");
        let (clean, leaked) = guard.scrub("Copy\nx");
        assert_eq!(clean, "x");
        assert_eq!(leaked, vec!["Copy".to_string()]);
        assert!(!guard.looks_like_code("import os"));
    }

    #[test]
    fn test_leaked_labels_leave_text_alone() {
        let guard = OutputGuard::default();
        let text = "print(\"Click here\")";
        assert_eq!(guard.leaked_labels(text), vec!["Click here".to_string()]);
        assert!(guard.leaked_labels("rclpy.init()").is_empty());
    }
}
