//! Unlock-mode decoding: either a code-only grant or a fixed denial.

use super::sections::strip_code_fences;
use crate::guardrails::OutputGuard;
use crate::protocol::{
    BLOCKED_SENTINEL, CLOSING_MARKER, RECOVERY_CODE, UNLOCKED_STATUS, UNLOCK_DENIED_FIX_STEPS,
    UNLOCK_DENIED_ROOT_CAUSE,
};
use crate::types::{DiagnosticResult, Metadata, ProtocolViolation, RiskLevel, Sections};

pub(super) fn decode(raw: &str, guard: &OutputGuard) -> DiagnosticResult {
    let without_marker = raw.trim().replace(CLOSING_MARKER, "");
    let without_marker = without_marker.trim();

    // A repeated RECOVERY_CODE header means the backend echoed its template;
    // the last block is the one it filled in.
    let candidate = match without_marker.rfind(RECOVERY_CODE) {
        Some(at) => &without_marker[at + RECOVERY_CODE.len()..],
        None => without_marker,
    };
    let code = strip_code_fences(candidate);

    if code.contains(BLOCKED_SENTINEL) {
        return denied(raw);
    }

    // Granted code is executable; leaked labels are recorded, never cut out.
    let leaked = guard.leaked_labels(&code);
    DiagnosticResult {
        metadata: Metadata {
            risk_level: None,
            confidence: 1.0,
            code_allowed: true,
            safety_gate_triggered: false,
        },
        sections: Sections {
            recovery_code: code,
            system_status: UNLOCKED_STATUS.to_string(),
            ..Default::default()
        },
        raw_text: raw.to_string(),
        violations: leaked
            .into_iter()
            .map(|label| ProtocolViolation::UiChromeLeak { label })
            .collect(),
    }
}

fn denied(raw: &str) -> DiagnosticResult {
    DiagnosticResult {
        metadata: Metadata {
            risk_level: Some(RiskLevel::High),
            confidence: 1.0,
            code_allowed: false,
            safety_gate_triggered: true,
        },
        sections: Sections {
            root_cause: UNLOCK_DENIED_ROOT_CAUSE.to_string(),
            fix_steps: UNLOCK_DENIED_FIX_STEPS.to_string(),
            recovery_code: BLOCKED_SENTINEL.to_string(),
            system_status: CLOSING_MARKER.to_string(),
            ..Default::default()
        },
        raw_text: raw.to_string(),
        violations: Vec::new(),
    }
}
