use std::sync::Arc;

use crate::classifier::ModeClassifier;
use crate::client::core::RomaClient;
use crate::client::execution::ResilientInvoker;
use crate::client::policy::RetryPolicy;
use crate::config::RomaConfig;
use crate::decoder::ResponseDecoder;
use crate::drivers::{Backend, GeminiBackend};
use crate::guardrails::OutputGuard;
use crate::memory::{FileMemoryStore, InMemoryStore, MemoryStore};
use crate::session::{SessionConfig, SessionLifecycle};
use crate::{Error, Result};

/// Builder for [`RomaClient`].
///
/// Only the backend is required. Memory defaults to an in-process store,
/// retry to 3 retries at 2s/4s/8s.
pub struct RomaClientBuilder {
    backend: Option<Arc<dyn Backend>>,
    memory: Option<Arc<dyn MemoryStore>>,
    session: SessionConfig,
    retry: RetryPolicy,
    guard: OutputGuard,
}

impl Default for RomaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RomaClientBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            memory: None,
            session: SessionConfig::default(),
            retry: RetryPolicy::default(),
            guard: OutputGuard::default(),
        }
    }

    /// Start from a loaded configuration; the backend still has to be set.
    pub fn from_config(config: &RomaConfig) -> Self {
        let mut builder = Self::new()
            .session_config(config.session_config())
            .retry_policy(RetryPolicy::from_config(&config.retry));
        if let Some(dir) = &config.memory_dir {
            builder = builder.memory_store(Arc::new(FileMemoryStore::new(dir.clone())));
        }
        builder
    }

    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn memory_store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(store);
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn output_guard(mut self, guard: OutputGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn build(self) -> Result<RomaClient> {
        let backend = self
            .backend
            .ok_or_else(|| Error::configuration("a backend is required"))?;
        Ok(RomaClient {
            backend,
            memory: self
                .memory
                .unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            classifier: ModeClassifier::new(),
            decoder: ResponseDecoder::new(self.guard),
            invoker: ResilientInvoker::new(self.retry),
            sessions: SessionLifecycle::new(self.session),
            is_first_turn: true,
        })
    }
}

impl RomaClient {
    pub fn builder() -> RomaClientBuilder {
        RomaClientBuilder::new()
    }

    /// Validate `config` and connect to Gemini with the resolved API key.
    pub fn from_config(config: &RomaConfig) -> Result<Self> {
        config.validate()?;
        let backend = GeminiBackend::from_config(config)?;
        RomaClientBuilder::from_config(config)
            .backend(Arc::new(backend))
            .build()
    }
}
