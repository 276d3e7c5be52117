//! # roma-protocol
//!
//! ROMA 工业机器人诊断助手的会话协议层：模式识别、上下文组装、弹性调用与响应解码。
//!
//! Conversation protocol layer for ROMA, an industrial-robot diagnostics
//! assistant backed by a text-generation service.
//!
//! ## Overview
//!
//! Each user turn goes through four stages:
//!
//! 1. **Classify** the message into a [`ConversationMode`] (greeting,
//!    diagnostic, unlock, idle).
//! 2. **Compose** the outgoing payload with the hidden robot-model tag and
//!    user-memory block.
//! 3. **Invoke** the backend, retrying rate limits with bounded backoff.
//! 4. **Decode** the free-form reply into a typed [`DiagnosticResult`].
//!
//! The backend is told how to lay out its replies but is not trusted to do
//! so. The decoder re-derives the safety rules on its own:
//!
//! - `recoveryCode` holds executable content only after a granted unlock;
//!   otherwise it is `BLOCKED BY SAFETY GATE`.
//! - A record never carries diagnostics and executable code together.
//! - Diagnostic replies end with the closing marker exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roma_protocol::{RomaClient, RomaConfig, TurnRequest};
//!
//! #[tokio::main]
//! async fn main() -> roma_protocol::Result<()> {
//!     let config = RomaConfig::default().apply_env()?;
//!     let mut client = RomaClient::from_config(&config)?;
//!
//!     let greeting = client.greet().await?;
//!     println!("{}", greeting.sections.root_cause);
//!
//!     let report = client
//!         .submit_turn(TurnRequest::new("Axis 3 overcurrent alarm after collision").with_robot_model("KUKA KR 10"))
//!         .await?;
//!     println!("{:?} {}", report.metadata.risk_level, report.sections.root_cause);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`classifier`] | Rule-based mode classification |
//! | [`composer`] | Outgoing payload composition |
//! | [`client`] | Turn orchestration, retry policy, resilient invoker |
//! | [`config`] | YAML / environment configuration and API key lookup |
//! | [`decoder`] | Reply decoding into [`DiagnosticResult`] |
//! | [`drivers`] | Backend trait, Gemini driver, scripted double |
//! | [`guardrails`] | UI chrome scrubbing and code detection |
//! | [`memory`] | Per-user fact accumulation and stores |
//! | [`protocol`] | Fixed markers, sentinel, system instruction |
//! | [`session`] | Session lifecycle (reset on every non-unlock turn) |
//! | [`types`] | Modes, message parts, result record |

pub mod classifier;
pub mod client;
pub mod composer;
pub mod config;
pub mod decoder;
pub mod drivers;
pub mod error_code;
pub mod guardrails;
pub mod memory;
pub mod protocol;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use client::{RomaClient, RomaClientBuilder, TurnRequest, UserIdentity};
pub use config::RomaConfig;
pub use decoder::{decode, ResponseDecoder};
pub use error_code::BackendErrorKind;
pub use types::{ConversationMode, DiagnosticResult, RiskLevel};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
