//! 会话生命周期管理：除解锁轮次外，每轮都丢弃旧会话并新建会话。
//!
//! # Session Lifecycle
//!
//! A backend session accumulates conversational drift. To keep one topic
//! from bleeding into the next, every non-Unlock turn starts on a fresh
//! session. An Unlock turn reuses the live session so the backend can see the
//! diagnostic it is unlocking.
//!
//! | State | Event | Next |
//! |-------|-------|------|
//! | Absent | acquire(any) | Live (new) |
//! | Live | acquire(Unlock) | Live (same) |
//! | Live | acquire(other) | Live (new) |
//!
//! The manager is owned by exactly one conversation. Sharing it between
//! concurrent turns would race on the reset.

use tracing::debug;
use uuid::Uuid;

use crate::drivers::Backend;
use crate::protocol::{DEFAULT_TEMPERATURE, SYSTEM_INSTRUCTION};
use crate::types::{ConversationMode, Content};
use crate::Result;

/// Parameters every session is opened with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub system_instruction: String,
    pub temperature: f64,
    pub model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            model: crate::config::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Conversation context held for the backend.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    config: SessionConfig,
    history: Vec<Content>,
}

impl SessionHandle {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Record a completed user/model exchange.
    pub fn push_exchange(&mut self, user: Content, reply: Content) {
        self.history.push(user);
        self.history.push(reply);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Live,
}

#[derive(Debug, Default)]
pub struct SessionLifecycle {
    handle: Option<SessionHandle>,
    config: SessionConfig,
}

impl SessionLifecycle {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            handle: None,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.handle {
            Some(_) => SessionState::Live,
            None => SessionState::Absent,
        }
    }

    pub fn current(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    /// Handle to use for a turn in `mode`.
    pub async fn acquire(
        &mut self,
        mode: ConversationMode,
        backend: &dyn Backend,
    ) -> Result<&mut SessionHandle> {
        let handle = match self.handle.take() {
            Some(live) if mode.is_unlock() => {
                debug!(session = %live.id(), "Reusing session for unlock");
                live
            }
            stale => {
                if let Some(old) = stale {
                    debug!(session = %old.id(), mode = %mode, "Discarding session");
                }
                let fresh = backend.open_session(&self.config).await?;
                debug!(session = %fresh.id(), mode = %mode, "Opened session");
                fresh
            }
        };
        Ok(self.handle.insert(handle))
    }

    /// Drop the live session, if any.
    pub fn discard(&mut self) {
        if let Some(old) = self.handle.take() {
            debug!(session = %old.id(), "Discarding session");
        }
    }
}
