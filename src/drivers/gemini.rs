//! Gemini generateContent 驱动：请求体构造、响应文本提取、失败信息保留。
//!
//! Google Gemini `generateContent` backend.
//! - The system instruction is a top-level `system_instruction`.
//! - Temperature lives in `generationConfig`.
//! - Turns are `contents` with `user` / `model` roles; images are
//!   `inline_data` parts.
//! - The API key travels in the `x-goog-api-key` header, never in the URL.
//! - Reply text is `candidates[0].content.parts[*].text`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::{Backend, BackendFailure};
use crate::config::{resolve_api_key, RomaConfig};
use crate::error::ErrorContext;
use crate::session::{SessionConfig, SessionHandle};
use crate::types::{Content, Part, RequestPayload, Role};
use crate::{Error, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(config: &RomaConfig, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base_url {:?}", config.base_url),
                ErrorContext::new()
                    .with_source("gemini")
                    .with_details(e.to_string()),
            )
        })?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Build with the API key from the keyring or environment.
    pub fn from_config(config: &RomaConfig) -> Result<Self> {
        let key = resolve_api_key().ok_or_else(|| {
            Error::configuration(
                "no API key: store one in the keyring (roma/gemini) or set GEMINI_API_KEY",
            )
        })?;
        Self::new(config, key)
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            model
        )
    }

    /// Request body for `payload` sent on top of the session history.
    pub fn request_body(session: &SessionHandle, payload: &RequestPayload) -> Value {
        let mut contents: Vec<Value> = session.history().iter().map(content_to_json).collect();
        contents.push(json!({
            "role": "user",
            "parts": parts_to_json(&payload.parts),
        }));
        let config = session.config();
        json!({
            "system_instruction": { "parts": [{ "text": config.system_instruction }] },
            "contents": contents,
            "generationConfig": { "temperature": config.temperature },
        })
    }

    /// Concatenated text of the first candidate, if it has any.
    pub fn reply_text(body: &Value) -> Option<String> {
        let parts = body
            .pointer("/candidates/0/content/parts")?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn parts_to_json(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => json!({ "text": text }),
            Part::InlineData { mime_type, data } => json!({
                "inline_data": { "mime_type": mime_type, "data": data }
            }),
        })
        .collect()
}

fn content_to_json(content: &Content) -> Value {
    let role = match content.role {
        Role::User => "user",
        Role::Model => "model",
    };
    json!({ "role": role, "parts": parts_to_json(&content.parts) })
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn open_session(&self, config: &SessionConfig) -> Result<SessionHandle> {
        // Sessions are client-side history; nothing to create remotely.
        Ok(SessionHandle::new(config.clone()))
    }

    async fn send(
        &self,
        session: &mut SessionHandle,
        payload: &RequestPayload,
    ) -> std::result::Result<Option<String>, BackendFailure> {
        let body = Self::request_body(session, payload);
        let resp = self
            .client
            .post(self.endpoint(&session.config().model))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendFailure::new(e.without_url().to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| {
                BackendFailure::new(e.without_url().to_string()).with_status(status.as_u16())
            })?;

        if !status.is_success() {
            let mut failure = BackendFailure::new(
                status.canonical_reason().unwrap_or("request failed"),
            )
            .with_status(status.as_u16());
            match serde_json::from_str::<Value>(&text) {
                Ok(json) => {
                    if let Some(message) = json.pointer("/error/message").and_then(Value::as_str) {
                        failure.message = message.to_string();
                    }
                    failure = failure.with_body(json);
                }
                Err(_) if !text.is_empty() => failure = failure.with_body(Value::String(text)),
                Err(_) => {}
            }
            return Err(failure);
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| BackendFailure::new(format!("malformed response: {}", e)))?;
        let reply = Self::reply_text(&json);
        if let Some(ref reply) = reply {
            session.push_exchange(
                Content::user(payload.parts.clone()),
                Content::model(reply.clone()),
            );
        }
        Ok(reply)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
