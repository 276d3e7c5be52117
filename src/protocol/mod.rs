//! 协议常量：解码器依赖的固定段落标记、结束语、解锁短语与哨兵字符串。
//!
//! Fixed protocol tokens.
//!
//! The backend is instructed (see [`SYSTEM_INSTRUCTION`]) to lay its replies
//! out with these markers. The decoder treats them as the only structure it
//! can rely on, and matches them verbatim.

mod instruction;

pub use instruction::SYSTEM_INSTRUCTION;

pub const RISK_LEVEL: &str = "RISK_LEVEL:";
pub const CONFIDENCE: &str = "CONFIDENCE:";
pub const ROOT_CAUSE: &str = "ROOT_CAUSE:";
pub const FIX_STEPS: &str = "FIX_STEPS:";
pub const SAFETY_CHECKLIST: &str = "SAFETY_CHECKLIST:";
pub const RECOVERY_CODE: &str = "RECOVERY_CODE:";
pub const PREVENTION_STRATEGY: &str = "PREVENTION_STRATEGY:";
pub const POST_VALIDATION: &str = "POST_VALIDATION:";
pub const UI_METADATA: &str = "UI_METADATA:";
pub const AUDIT_LOG: &str = "AUDIT_LOG:";
pub const SYSTEM_STATUS: &str = "SYSTEM_STATUS:";
pub const USER_MEMORY_UPDATE: &str = "USER_MEMORY_UPDATE:";

/// Every header that terminates the block before it.
///
/// `UI_METADATA:` and `SYSTEM_STATUS:` are never surfaced as sections but
/// still bound their neighbours.
pub const SECTION_HEADERS: &[&str] = &[
    RISK_LEVEL,
    CONFIDENCE,
    ROOT_CAUSE,
    FIX_STEPS,
    SAFETY_CHECKLIST,
    RECOVERY_CODE,
    PREVENTION_STRATEGY,
    POST_VALIDATION,
    UI_METADATA,
    AUDIT_LOG,
    SYSTEM_STATUS,
    USER_MEMORY_UPDATE,
];

/// Closing marker ending every diagnostic reply.
pub const CLOSING_MARKER: &str = "Standing by for next input.";

/// The only user input that enters Unlock mode.
pub const UNLOCK_PHRASE: &str = "I confirm all safety checks. Unlock code.";

/// Placeholder standing in for recovery code whenever code is not permitted.
pub const BLOCKED_SENTINEL: &str = "BLOCKED BY SAFETY GATE";

/// Prefix the backend's greeting is recognised by.
pub const GREETING_PREFIX: &str = "ROMA online. Provide robot model";

/// Full greeting sentence placed into `rootCause` of a greeting record.
pub const GREETING_SENTENCE: &str =
    "ROMA online. Provide robot model, logs, or workspace image to begin diagnostics.";

/// Reply the backend gives to idle keywords.
pub const IDLE_REPLY: &str = "ROMA entering idle mode. Ready when needed.";

/// `systemStatus` of a granted unlock. Distinct from [`CLOSING_MARKER`].
pub const UNLOCKED_STATUS: &str = "Recovery sequence unlocked.";

pub const UNLOCK_DENIED_ROOT_CAUSE: &str =
    "Unlock Denied: Safety metrics violated critical limits.";

pub const UNLOCK_DENIED_FIX_STEPS: &str =
    "1. Review safety checklist.\n2. Ensure all metrics are within limits.\n3. Retry unlock command.";

/// Text sent as the first turn so the backend produces its greeting.
pub const STARTUP_MESSAGE: &str = "System Startup";

/// Temperature the backend is driven at (near-deterministic).
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
