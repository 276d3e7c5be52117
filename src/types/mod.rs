//! 类型系统模块：会话模式、消息部件与诊断结果记录。
//!
//! # Types Module
//!
//! Core data types shared by every stage of a turn.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConversationMode`] | Per-turn mode (greeting, diagnostic, unlock, idle) |
//! | [`Part`] | One part of an outgoing message (text or inline image) |
//! | [`Content`] | A role-tagged list of parts, kept as session history |
//! | [`RequestPayload`] | What the Context Composer hands to the invoker |
//! | [`DiagnosticResult`] | The canonical decoded record |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`message`] | Message parts, image attachments, request payloads |
//! | [`mode`] | Conversation modes |
//! | [`result`] | Decoded result record, risk levels, protocol violations |

pub mod message;
pub mod mode;
pub mod result;

pub use message::{Content, ImageAttachment, Part, RequestPayload, Role};
pub use mode::ConversationMode;
pub use result::{DiagnosticResult, Metadata, ProtocolViolation, RiskLevel, Sections};
