//! The canonical decoded record handed to the presentation layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::protocol::{BLOCKED_SENTINEL, CLOSING_MARKER, GREETING_PREFIX};

/// Risk level parsed from `RISK_LEVEL:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    /// Only the four canonical upper-case tokens are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub risk_level: Option<RiskLevel>,
    pub confidence: f64,
    /// True only after a granted unlock.
    pub code_allowed: bool,
    /// True whenever a risk level is present.
    pub safety_gate_triggered: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    pub root_cause: String,
    pub fix_steps: String,
    pub safety_checklist: String,
    pub recovery_code: String,
    pub prevention_strategy: String,
    pub post_validation: String,
    pub audit_log: String,
    pub system_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_memory_update: Option<String>,
}

/// A deviation from the reply layout the backend was instructed to follow.
///
/// Violations never fail a decode. They are corrected where possible and
/// recorded here for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProtocolViolation {
    /// Diagnostics and executable code in the same reply; the code was suppressed.
    CodeInDiagnostic,
    /// The closing marker appeared more than once.
    DuplicateClosingMarker { count: usize },
    /// More than one `ROOT_CAUSE:` block; only the first was kept.
    MultipleDiagnosticBlocks { count: usize },
    /// Interface text leaked into the reply and was scrubbed.
    UiChromeLeak { label: String },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeInDiagnostic => write!(f, "recovery code emitted alongside diagnostics"),
            Self::DuplicateClosingMarker { count } => {
                write!(f, "closing marker repeated {} times", count)
            }
            Self::MultipleDiagnosticBlocks { count } => {
                write!(f, "{} diagnostic blocks in one reply", count)
            }
            Self::UiChromeLeak { label } => write!(f, "interface text leaked: {:?}", label),
        }
    }
}

/// Decoded backend reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub metadata: Metadata,
    pub sections: Sections,
    /// The untouched backend reply.
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ProtocolViolation>,
}

impl DiagnosticResult {
    /// Greeting card: the greeting sentence with no risk attached.
    pub fn is_greeting(&self) -> bool {
        self.sections.root_cause.contains(GREETING_PREFIX) && self.metadata.risk_level.is_none()
    }

    /// Unlocked code view: code allowed, no risk, something to show.
    pub fn is_code_only(&self) -> bool {
        self.metadata.code_allowed
            && self.metadata.risk_level.is_none()
            && !self.sections.recovery_code.is_empty()
    }

    /// Whether `recoveryCode` holds the sentinel rather than executable content.
    pub fn is_code_blocked(&self) -> bool {
        self.sections.recovery_code == BLOCKED_SENTINEL
    }

    pub fn has_diagnostics(&self) -> bool {
        let s = &self.sections;
        [
            &s.root_cause,
            &s.fix_steps,
            &s.safety_checklist,
            &s.prevention_strategy,
            &s.post_validation,
            &s.audit_log,
        ]
        .iter()
        .any(|t| !t.is_empty())
    }

    /// Holds the sentinel/allowed and diagnostics/code exclusivity rules.
    pub fn upholds_safety_invariants(&self) -> bool {
        let code_ok = self.metadata.code_allowed || self.is_code_blocked();
        let exclusive = !(self.has_diagnostics() && !self.is_code_blocked());
        let status_ok = self.sections.system_status.matches(CLOSING_MARKER).count() <= 1;
        code_ok && exclusive && status_ok
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON schema of the record, for validating it on the presentation side.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(DiagnosticResult);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}
