//! 弹性调用：单次后端调用的错误分类与有界指数退避重试。
//!
//! Resilient invocation of one backend turn.

use tracing::warn;

use super::error_classification::classify_failure;
use super::policy::{Decision, RetryPolicy};
use crate::drivers::Backend;
use crate::error::ErrorContext;
use crate::session::SessionHandle;
use crate::types::RequestPayload;
use crate::{Error, Result};

/// Wraps [`Backend::send`] with classification and retry.
///
/// Rate limits are retried per the [`RetryPolicy`]; quota stops, empty
/// replies and unclassified failures surface on the first occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResilientInvoker {
    policy: RetryPolicy,
}

impl ResilientInvoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `payload` and return the raw reply text.
    pub async fn invoke(
        &self,
        backend: &dyn Backend,
        session: &mut SessionHandle,
        payload: &RequestPayload,
    ) -> Result<String> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let failure = match backend.send(session, payload).await {
                Ok(Some(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => {
                    return Err(Error::EmptyReply {
                        context: ErrorContext::new()
                            .with_source(backend.name())
                            .with_attempts(attempts),
                    })
                }
                Err(failure) => failure,
            };

            let kind = classify_failure(&failure.dump());
            match self.policy.decide(kind, attempts) {
                Decision::Retry { delay } => {
                    warn!(
                        backend = backend.name(),
                        error = %kind,
                        retry = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Backend throttled, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Decision::Fail => {
                    let mut context = ErrorContext::new()
                        .with_source(backend.name())
                        .with_attempts(attempts);
                    if let Some(status) = failure.status {
                        context = context.with_status_code(status);
                    }
                    return Err(Error::from_kind(kind, failure.message, context));
                }
            }
        }
    }
}
