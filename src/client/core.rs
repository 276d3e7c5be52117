use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::execution::ResilientInvoker;
use crate::classifier::{ModeClassifier, TurnSignals};
use crate::composer::compose;
use crate::decoder::ResponseDecoder;
use crate::drivers::Backend;
use crate::memory::{merge, MemoryContext, MemoryStore};
use crate::protocol::STARTUP_MESSAGE;
use crate::session::{SessionLifecycle, SessionState};
use crate::types::{DiagnosticResult, ImageAttachment};
use crate::Result;

/// Who is talking, for the hidden user-context block and memory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub display_name: String,
    /// Stable key of the user's memory (an e-mail address, typically).
    pub identity: String,
}

impl UserIdentity {
    pub fn new(display_name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            identity: identity.into(),
        }
    }
}

/// One user turn.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub text: String,
    pub image: Option<ImageAttachment>,
    pub robot_model: Option<String>,
    pub user: Option<UserIdentity>,
}

impl TurnRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_robot_model(mut self, model: impl Into<String>) -> Self {
        self.robot_model = Some(model.into());
        self
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    fn signals(&self) -> TurnSignals {
        TurnSignals {
            has_image: self.image.is_some(),
            has_robot_model: self
                .robot_model
                .as_deref()
                .map_or(false, |m| !m.trim().is_empty()),
        }
    }
}

/// One conversation with the backend.
///
/// Turns take `&mut self`, so a turn can only start once the previous one has
/// been decoded or has failed.
pub struct RomaClient {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) memory: Arc<dyn MemoryStore>,
    pub(crate) classifier: ModeClassifier,
    pub(crate) decoder: ResponseDecoder,
    pub(crate) invoker: ResilientInvoker,
    pub(crate) sessions: SessionLifecycle,
    pub(crate) is_first_turn: bool,
}

impl RomaClient {
    /// Send the startup turn a chat surface issues when it opens, so the backend greets.
    pub async fn greet(&mut self) -> Result<DiagnosticResult> {
        self.submit_turn(TurnRequest::new(STARTUP_MESSAGE)).await
    }

    /// Classify, compose, send and decode one turn.
    pub async fn submit_turn(&mut self, request: TurnRequest) -> Result<DiagnosticResult> {
        let started = Instant::now();
        let mode = self
            .classifier
            .classify(&request.text, self.is_first_turn, request.signals());

        let memory = match (&request.user, mode) {
            (Some(user), mode) if !mode.is_unlock() => Some(self.memory_context(user).await),
            _ => None,
        };

        let payload = compose(
            mode,
            &request.text,
            request.image.as_ref(),
            request.robot_model.as_deref(),
            memory.as_ref(),
        );

        let session = self.sessions.acquire(mode, self.backend.as_ref()).await?;
        let session_id = session.id();
        let raw = self
            .invoker
            .invoke(self.backend.as_ref(), session, &payload)
            .await?;

        let result = self.decoder.decode(&raw, mode);
        self.is_first_turn = false;

        if let (Some(ctx), Some(fact)) = (&memory, result.sections.user_memory_update.as_deref()) {
            self.remember(ctx, fact).await;
        }

        info!(
            mode = %mode,
            session = %session_id,
            risk_level = ?result.metadata.risk_level,
            code_allowed = result.metadata.code_allowed,
            violations = result.violations.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Turn decoded"
        );
        Ok(result)
    }

    async fn memory_context(&self, user: &UserIdentity) -> MemoryContext {
        let memory = match self.memory.get(&user.identity).await {
            Ok(memory) => memory.unwrap_or_default(),
            Err(e) => {
                warn!(store = self.memory.name(), error = %e, "Memory read failed; continuing without it");
                String::new()
            }
        };
        MemoryContext {
            display_name: user.display_name.clone(),
            identity: user.identity.clone(),
            memory,
        }
    }

    /// The turn has already been decoded; a store failure only costs the fact.
    async fn remember(&self, ctx: &MemoryContext, fact: &str) {
        let merged = merge(&ctx.memory, Some(fact));
        if let Err(e) = self.memory.put(&ctx.identity, &merged).await {
            warn!(store = self.memory.name(), error = %e, "Memory write failed");
        }
    }

    pub fn is_first_turn(&self) -> bool {
        self.is_first_turn
    }

    pub fn session_state(&self) -> SessionState {
        self.sessions.state()
    }

    /// Forget the live session and start over as if freshly opened.
    pub fn reset(&mut self) {
        self.sessions.discard();
        self.is_first_turn = true;
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn memory_store(&self) -> &dyn MemoryStore {
        self.memory.as_ref()
    }
}

impl std::fmt::Debug for RomaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomaClient")
            .field("backend", &self.backend.name())
            .field("memory", &self.memory.name())
            .field("session", &self.sessions.state())
            .field("is_first_turn", &self.is_first_turn)
            .finish()
    }
}
