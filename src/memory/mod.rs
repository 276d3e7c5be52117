//! 用户记忆模块：按用户身份累积“请记住”的事实片段。
//!
//! # User Memory
//!
//! Each user identity owns one delimiter-joined string of remembered facts.
//! It is read before composing a request and rewritten after a decode yields
//! a new `USER_MEMORY_UPDATE:` fact.
//!
//! Accumulation is append-only: facts are never deduplicated and the string
//! is not capped.
//!
//! ```rust
//! use roma_protocol::memory::merge;
//!
//! let memory = merge("", Some("Uses KUKA in Cell 1"));
//! let memory = merge(&memory, Some("Night shift runs at 60% speed"));
//! assert_eq!(memory, "Uses KUKA in Cell 1 | Night shift runs at 60% speed");
//! assert_eq!(merge(&memory, None), memory);
//! ```

mod backend;

pub use backend::{FileMemoryStore, InMemoryStore, MemoryStore};

/// Separator between accumulated facts.
pub const MEMORY_DELIMITER: &str = " | ";

/// What the Context Composer needs to build the hidden user-context block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryContext {
    pub display_name: String,
    pub identity: String,
    pub memory: String,
}

/// Append `new_fact` to `existing`.
pub fn merge(existing: &str, new_fact: Option<&str>) -> String {
    match new_fact.map(str::trim).filter(|f| !f.is_empty()) {
        None => existing.to_string(),
        Some(fact) if existing.is_empty() => fact.to_string(),
        Some(fact) => format!("{}{}{}", existing, MEMORY_DELIMITER, fact),
    }
}
