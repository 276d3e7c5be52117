//! Turn orchestration for one ROMA conversation.
//!
//! The public surface is [`RomaClient`]; retry and classification are split
//! into submodules.

pub mod builder;
pub mod core;
pub mod error_classification;
pub mod execution;
pub mod policy;

pub use builder::RomaClientBuilder;
pub use self::core::{RomaClient, TurnRequest, UserIdentity};
pub use error_classification::classify_failure;
pub use execution::ResilientInvoker;
pub use policy::{Decision, RetryPolicy};
