//! Scripted backend for tests and offline demos.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{Backend, BackendFailure};
use crate::session::{SessionConfig, SessionHandle};
use crate::types::{Content, RequestPayload};
use crate::Result;

/// One queued outcome of [`Backend::send`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// The service answered with no text at all.
    Empty,
    Failure(BackendFailure),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ScriptedReply::Failure(BackendFailure::new(message))
    }
}

/// A payload as received, with the session it was sent on.
#[derive(Debug, Clone)]
pub struct SentTurn {
    pub session: Uuid,
    pub payload: RequestPayload,
}

/// Replays queued replies in order. Running out of script is a failure.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    sent: Mutex<Vec<SentTurn>>,
    sessions_opened: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let backend = Self::new();
        for reply in replies {
            backend.push(reply);
        }
        backend
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(ScriptedReply::text(text));
    }

    /// Every payload received so far.
    pub fn sent(&self) -> Vec<SentTurn> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn open_session(&self, config: &SessionConfig) -> Result<SessionHandle> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(SessionHandle::new(config.clone()))
    }

    async fn send(
        &self,
        session: &mut SessionHandle,
        payload: &RequestPayload,
    ) -> std::result::Result<Option<String>, BackendFailure> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentTurn {
                session: session.id(),
                payload: payload.clone(),
            });
        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => {
                session.push_exchange(
                    Content::user(payload.parts.clone()),
                    Content::model(text.clone()),
                );
                Ok(Some(text))
            }
            Some(ScriptedReply::Empty) => Ok(None),
            Some(ScriptedReply::Failure(failure)) => Err(failure),
            None => Err(BackendFailure::new("scripted backend has no reply left")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationMode, Part};

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let backend = ScriptedBackend::with_replies([
            ScriptedReply::text("first"),
            ScriptedReply::Empty,
            ScriptedReply::failure("boom"),
        ]);
        let mut session = backend.open_session(&SessionConfig::default()).await.unwrap();
        let payload = RequestPayload {
            mode: ConversationMode::Diagnostic,
            parts: vec![Part::text("hi")],
        };

        assert_eq!(backend.send(&mut session, &payload).await.unwrap().as_deref(), Some("first"));
        assert_eq!(backend.send(&mut session, &payload).await.unwrap(), None);
        assert_eq!(backend.send(&mut session, &payload).await.unwrap_err().message, "boom");
        assert!(backend.send(&mut session, &payload).await.is_err());

        assert_eq!(backend.calls(), 4);
        assert_eq!(session.history().len(), 2);
        assert!(backend.sent().iter().all(|t| t.session == session.id()));
    }
}
