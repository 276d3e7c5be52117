//! Diagnostic, greeting, and idle decoding.

use super::sections::{block, field_value, find_block, parse_confidence};
use crate::guardrails::OutputGuard;
use crate::protocol::{
    AUDIT_LOG, BLOCKED_SENTINEL, CLOSING_MARKER, CONFIDENCE, FIX_STEPS, GREETING_PREFIX,
    GREETING_SENTENCE, POST_VALIDATION, PREVENTION_STRATEGY, RECOVERY_CODE, RISK_LEVEL,
    ROOT_CAUSE, SAFETY_CHECKLIST, USER_MEMORY_UPDATE,
};
use crate::types::{DiagnosticResult, Metadata, ProtocolViolation, RiskLevel, Sections};

/// Values the backend writes when it has nothing to remember.
const EMPTY_FACT_PLACEHOLDERS: &[&str] = &["none", "n/a", "na", "-", "null", "nothing"];

pub(super) fn decode(raw: &str, guard: &OutputGuard) -> DiagnosticResult {
    let clean = raw.trim();

    if clean.contains(GREETING_PREFIX) && !clean.contains(RISK_LEVEL) {
        return greeting(raw);
    }

    let mut violations = Vec::new();

    let closing = clean.matches(CLOSING_MARKER).count();
    if closing > 1 {
        violations.push(ProtocolViolation::DuplicateClosingMarker { count: closing });
    }
    let blocks = clean.matches(ROOT_CAUSE).count();
    if blocks > 1 {
        violations.push(ProtocolViolation::MultipleDiagnosticBlocks { count: blocks });
    }

    let risk_level = field_value(clean, RISK_LEVEL).and_then(|v| v.parse::<RiskLevel>().ok());
    let confidence = field_value(clean, CONFIDENCE)
        .map(parse_confidence)
        .unwrap_or(0.0);

    let mut sections = Sections {
        root_cause: block(clean, ROOT_CAUSE),
        fix_steps: block(clean, FIX_STEPS),
        safety_checklist: block(clean, SAFETY_CHECKLIST),
        recovery_code: BLOCKED_SENTINEL.to_string(),
        prevention_strategy: block(clean, PREVENTION_STRATEGY),
        post_validation: block(clean, POST_VALIDATION),
        audit_log: block(clean, AUDIT_LOG),
        system_status: CLOSING_MARKER.to_string(),
        user_memory_update: find_block(clean, USER_MEMORY_UPDATE)
            .filter(|fact| is_meaningful_fact(fact))
            .map(str::to_string),
    };

    // Whatever the backend put under RECOVERY_CODE is discarded here; only
    // its presence is audited.
    if let Some(code) = find_block(clean, RECOVERY_CODE) {
        let code = code.trim();
        if !code.is_empty()
            && code != BLOCKED_SENTINEL
            && (guard.looks_like_code(code) || has_diagnostics(&sections))
        {
            violations.push(ProtocolViolation::CodeInDiagnostic);
        }
    }

    // Free text with no recognizable structure (idle acknowledgements, chatter).
    // Code never reaches rootCause through this path; the prose around it does.
    if risk_level.is_none() && sections.root_cause.is_empty() && !clean.is_empty() {
        let text = clean.replace(CLOSING_MARKER, "");
        let text = match text.find(RECOVERY_CODE) {
            Some(at) => &text[..at],
            None => text.as_str(),
        };
        let (prose, removed) = strip_code(text, guard);
        if removed && !violations.contains(&ProtocolViolation::CodeInDiagnostic) {
            violations.push(ProtocolViolation::CodeInDiagnostic);
        }
        sections.root_cause = prose;
    }

    scrub_sections(&mut sections, guard, &mut violations);

    DiagnosticResult {
        metadata: Metadata {
            risk_level,
            confidence,
            code_allowed: false,
            safety_gate_triggered: risk_level.is_some(),
        },
        sections,
        raw_text: raw.to_string(),
        violations,
    }
}

fn greeting(raw: &str) -> DiagnosticResult {
    DiagnosticResult {
        metadata: Metadata {
            risk_level: None,
            confidence: 1.0,
            code_allowed: false,
            safety_gate_triggered: false,
        },
        sections: Sections {
            root_cause: GREETING_SENTENCE.to_string(),
            recovery_code: BLOCKED_SENTINEL.to_string(),
            system_status: CLOSING_MARKER.to_string(),
            ..Default::default()
        },
        raw_text: raw.to_string(),
        violations: Vec::new(),
    }
}

fn has_diagnostics(sections: &Sections) -> bool {
    [
        &sections.root_cause,
        &sections.fix_steps,
        &sections.safety_checklist,
        &sections.prevention_strategy,
        &sections.post_validation,
    ]
    .iter()
    .any(|s| !s.is_empty())
}

/// Drop fenced blocks and code-looking lines; returns the remaining text and
/// whether anything was dropped. An unclosed fence runs to the end.
fn strip_code(text: &str, guard: &OutputGuard) -> (String, bool) {
    let mut kept = Vec::new();
    let mut removed = false;
    let mut in_fence = false;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            removed = true;
            // ```a``` on a single line opens and closes itself.
            if trimmed.matches("```").count() % 2 == 1 {
                in_fence = !in_fence;
            }
            continue;
        }
        if in_fence || guard.looks_like_code(line) {
            removed = true;
            continue;
        }
        kept.push(line);
    }
    (kept.join("\n").trim().to_string(), removed)
}

fn is_meaningful_fact(fact: &str) -> bool {
    let fact = fact.trim();
    !fact.is_empty()
        && !EMPTY_FACT_PLACEHOLDERS
            .iter()
            .any(|p| fact.eq_ignore_ascii_case(p))
        && !fact.starts_with("<Optional")
}

fn scrub_sections(
    sections: &mut Sections,
    guard: &OutputGuard,
    violations: &mut Vec<ProtocolViolation>,
) {
    let mut leaked: Vec<String> = Vec::new();
    let fields = [
        &mut sections.root_cause,
        &mut sections.fix_steps,
        &mut sections.safety_checklist,
        &mut sections.prevention_strategy,
        &mut sections.post_validation,
        &mut sections.audit_log,
    ];
    for field in fields {
        let (clean, labels) = guard.scrub(field.as_str());
        *field = clean;
        leaked.extend(labels);
    }
    leaked.sort();
    leaked.dedup();
    violations.extend(
        leaked
            .into_iter()
            .map(|label| ProtocolViolation::UiChromeLeak { label }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> OutputGuard {
        OutputGuard::default()
    }

    const REPORT: &str = "RISK_LEVEL: HIGH\nCONFIDENCE: 0.82\nROOT_CAUSE:\nAxis 2 encoder cable damaged.\nFIX_STEPS:\n1. Engage E-STOP.\n2. Replace cable.\nSAFETY_CHECKLIST:\n- [ ] Power isolated\nRECOVERY_CODE:\nBLOCKED BY SAFETY GATE\nPREVENTION_STRATEGY:\nRoute cable through drag chain.\nPOST_VALIDATION:\nJog axis 2 at 10% speed.\nUI_METADATA:\nCODE_ALLOWED: FALSE\nAUDIT_LOG:\nEncoder fault E-112 at 14:02.\nStanding by for next input.";

    #[test]
    fn test_full_report() {
        let r = decode(REPORT, &guard());
        assert_eq!(r.metadata.risk_level, Some(RiskLevel::High));
        assert_eq!(r.metadata.confidence, 0.82);
        assert!(r.metadata.safety_gate_triggered);
        assert!(!r.metadata.code_allowed);
        assert_eq!(r.sections.root_cause, "Axis 2 encoder cable damaged.");
        assert_eq!(r.sections.fix_steps, "1. Engage E-STOP.\n2. Replace cable.");
        assert_eq!(r.sections.post_validation, "Jog axis 2 at 10% speed.");
        assert_eq!(r.sections.audit_log, "Encoder fault E-112 at 14:02.");
        assert_eq!(r.sections.recovery_code, BLOCKED_SENTINEL);
        assert_eq!(r.sections.system_status, CLOSING_MARKER);
        assert_eq!(r.sections.user_memory_update, None);
        assert!(r.violations.is_empty());
        assert_eq!(r.raw_text, REPORT);
    }

    #[test]
    fn test_code_in_diagnostic_is_suppressed() {
        let raw = REPORT.replace(
            "BLOCKED BY SAFETY GATE",
            "```python\nimport rclpy\nrclpy.init()\n```",
        );
        let r = decode(&raw, &guard());
        assert_eq!(r.sections.recovery_code, BLOCKED_SENTINEL);
        assert!(r.violations.contains(&ProtocolViolation::CodeInDiagnostic));
        assert!(r.upholds_safety_invariants());
    }

    #[test]
    fn test_greeting() {
        let r = decode(GREETING_SENTENCE, &guard());
        assert!(r.is_greeting());
        assert_eq!(r.metadata.confidence, 1.0);
        assert_eq!(r.sections.recovery_code, BLOCKED_SENTINEL);
    }

    #[test]
    fn test_greeting_prefix_with_risk_is_diagnostic() {
        let raw = format!("{}\nRISK_LEVEL: LOW\nROOT_CAUSE: x", GREETING_SENTENCE);
        let r = decode(&raw, &guard());
        assert!(!r.is_greeting());
        assert_eq!(r.metadata.risk_level, Some(RiskLevel::Low));
    }

    #[test]
    fn test_unstructured_text_falls_back_to_root_cause() {
        let r = decode(
            "ROMA entering idle mode. Ready when needed.\nStanding by for next input.",
            &guard(),
        );
        assert_eq!(r.sections.root_cause, "ROMA entering idle mode. Ready when needed.");
        assert_eq!(r.metadata.risk_level, None);
        assert!(!r.metadata.safety_gate_triggered);
        assert_eq!(r.sections.recovery_code, BLOCKED_SENTINEL);
    }

    #[test]
    fn test_fallback_never_surfaces_code() {
        let r = decode("```python\nimport rclpy\n```", &guard());
        assert!(r.sections.root_cause.is_empty());
        assert_eq!(r.violations, vec![ProtocolViolation::CodeInDiagnostic]);

        let r = decode("Check the teach pendant.\nRECOVERY_CODE:\nimport rclpy", &guard());
        assert_eq!(r.sections.root_cause, "Check the teach pendant.");
        assert_eq!(r.violations, vec![ProtocolViolation::CodeInDiagnostic]);
    }

    #[test]
    fn test_fallback_keeps_prose_starting_with_from() {
        let r = decode(
            "Looks like a worn brake.\nfrom what you describe, axis 3 slips under load.\nStanding by for next input.",
            &guard(),
        );
        assert_eq!(
            r.sections.root_cause,
            "Looks like a worn brake.\nfrom what you describe, axis 3 slips under load."
        );
        assert!(r.violations.is_empty());
    }

    #[test]
    fn test_fallback_drops_fenced_block_but_keeps_prose() {
        let r = decode(
            "The log shows a stale joint state:\n```\n[ERROR] /joint_states timeout\n```\nCheck the encoder cable.",
            &guard(),
        );
        assert_eq!(
            r.sections.root_cause,
            "The log shows a stale joint state:\nCheck the encoder cable."
        );
        assert_eq!(r.violations, vec![ProtocolViolation::CodeInDiagnostic]);
        assert_eq!(r.sections.recovery_code, BLOCKED_SENTINEL);
        assert!(r.upholds_safety_invariants());
    }

    #[test]
    fn test_fallback_drops_code_lines_outside_fences() {
        let r = decode(
            "Restart the driver node:\nimport rclpy\nrclpy.init()\nThen re-home axis 1.",
            &guard(),
        );
        assert_eq!(r.sections.root_cause, "Restart the driver node:\nThen re-home axis 1.");
        assert_eq!(r.violations, vec![ProtocolViolation::CodeInDiagnostic]);
    }

    #[test]
    fn test_unknown_risk_token_is_absent() {
        let r = decode("RISK_LEVEL: Severe\nROOT_CAUSE: x", &guard());
        assert_eq!(r.metadata.risk_level, None);
        assert_eq!(r.sections.root_cause, "x");
        assert_eq!(r.metadata.confidence, 0.0);
    }

    #[test]
    fn test_memory_update() {
        let raw = format!("{}\nUSER_MEMORY_UPDATE: Cell 4 runs a UR10e", REPORT);
        let r = decode(&raw, &guard());
        assert_eq!(r.sections.user_memory_update.as_deref(), Some("Cell 4 runs a UR10e"));

        let raw = format!("{}\nUSER_MEMORY_UPDATE: None", REPORT);
        assert_eq!(decode(&raw, &guard()).sections.user_memory_update, None);
    }

    #[test]
    fn test_duplicate_markers_recorded() {
        let raw = format!("{}\nROOT_CAUSE: second\nStanding by for next input.", REPORT);
        let r = decode(&raw, &guard());
        assert_eq!(r.sections.root_cause, "Axis 2 encoder cable damaged.");
        assert!(r
            .violations
            .contains(&ProtocolViolation::DuplicateClosingMarker { count: 2 }));
        assert!(r
            .violations
            .contains(&ProtocolViolation::MultipleDiagnosticBlocks { count: 2 }));
        assert_eq!(r.sections.system_status.matches(CLOSING_MARKER).count(), 1);
    }

    #[test]
    fn test_chrome_scrubbed_from_sections() {
        let raw = REPORT.replace(
            "2. Replace cable.",
            "2. Replace cable.\n[Confirm Safety & Unlock]",
        );
        let r = decode(&raw, &guard());
        assert_eq!(r.sections.fix_steps, "1. Engage E-STOP.\n2. Replace cable.");
        assert_eq!(
            r.violations,
            vec![ProtocolViolation::UiChromeLeak {
                label: "Confirm Safety & Unlock".into()
            }]
        );
    }
}
