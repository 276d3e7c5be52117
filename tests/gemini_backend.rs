//! Gemini driver against a mock generateContent endpoint.

use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;

use roma_protocol::drivers::{Backend, GeminiBackend};
use roma_protocol::protocol::SYSTEM_INSTRUCTION;
use roma_protocol::session::SessionConfig;
use roma_protocol::types::{ConversationMode, Part, RequestPayload};
use roma_protocol::{BackendErrorKind, RiskLevel, RomaClient, RomaConfig, TurnRequest};

const PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn config(base_url: String) -> RomaConfig {
    RomaConfig {
        base_url,
        ..Default::default()
    }
}

fn payload(text: &str) -> RequestPayload {
    RequestPayload {
        mode: ConversationMode::Diagnostic,
        parts: vec![Part::text(text)],
    }
}

fn reply(text: &str) -> String {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

#[tokio::test]
async fn sends_instruction_temperature_and_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_query(Matcher::Missing)
        .match_body(Matcher::PartialJson(json!({
            "system_instruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "generationConfig": { "temperature": 0.1 },
            "contents": [{ "role": "user", "parts": [{ "text": "J2 brake fault" }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply("RISK_LEVEL: LOW"))
        .create_async()
        .await;

    let backend = GeminiBackend::new(&config(server.url()), "test-key").unwrap();
    let mut session = backend.open_session(&SessionConfig::default()).await.unwrap();
    let text = backend
        .send(&mut session, &payload("J2 brake fault"))
        .await
        .unwrap();

    assert_eq!(text.as_deref(), Some("RISK_LEVEL: LOW"));
    assert_eq!(session.history().len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn connect_failure_does_not_reveal_the_key() {
    let backend = GeminiBackend::new(&config("http://127.0.0.1:1/v1beta".into()), "SECRET-KEY-123").unwrap();
    let mut session = backend.open_session(&SessionConfig::default()).await.unwrap();
    let failure = backend
        .send(&mut session, &payload("x"))
        .await
        .unwrap_err();

    assert_eq!(failure.status, None);
    assert!(!failure.to_string().contains("SECRET-KEY-123"));
    assert!(!failure.dump().contains("secret-key-123"));
    assert!(!format!("{backend:?}").contains("SECRET-KEY-123"));

    let mut client = RomaClient::builder()
        .backend(Arc::new(backend))
        .build()
        .unwrap();
    let err = client
        .submit_turn(TurnRequest::new("Axis fault"))
        .await
        .unwrap_err();
    assert!(!err.to_string().contains("SECRET-KEY-123"));
    assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
}

#[tokio::test]
async fn history_is_replayed_on_the_next_turn() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(reply("one"))
        .create_async()
        .await;

    let backend = GeminiBackend::new(&config(server.url()), "k").unwrap();
    let mut session = backend.open_session(&SessionConfig::default()).await.unwrap();
    backend.send(&mut session, &payload("first")).await.unwrap();
    first.remove_async().await;

    let second = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "first" }] },
                { "role": "model", "parts": [{ "text": "one" }] },
                { "role": "user", "parts": [{ "text": "second" }] }
            ]
        })))
        .with_status(200)
        .with_body(reply("two"))
        .create_async()
        .await;
    let text = backend.send(&mut session, &payload("second")).await.unwrap();

    assert_eq!(text.as_deref(), Some("two"));
    second.assert_async().await;
}

#[tokio::test]
async fn http_failure_keeps_status_and_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": {
                    "code": 429,
                    "message": "You exceeded your current quota, please check your plan and billing details.",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let backend = GeminiBackend::new(&config(server.url()), "k").unwrap();
    let mut session = backend.open_session(&SessionConfig::default()).await.unwrap();
    let failure = backend
        .send(&mut session, &payload("x"))
        .await
        .unwrap_err();

    assert_eq!(failure.status, Some(429));
    assert!(failure.message.starts_with("You exceeded your current quota"));
    assert!(failure.dump().contains("resource_exhausted"));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn reply_without_candidates_is_empty() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "candidates": [] }).to_string())
        .create_async()
        .await;

    let backend = GeminiBackend::new(&config(server.url()), "k").unwrap();
    let mut session = backend.open_session(&SessionConfig::default()).await.unwrap();
    assert_eq!(backend.send(&mut session, &payload("x")).await.unwrap(), None);
}

#[tokio::test]
async fn client_turn_over_http() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(reply(
            "RISK_LEVEL: CRITICAL\nCONFIDENCE: 0.95\nROOT_CAUSE:\nSafety PLC lost the light curtain.\nRECOVERY_CODE:\nBLOCKED BY SAFETY GATE\nStanding by for next input.",
        ))
        .create_async()
        .await;

    let cfg = config(server.url());
    let backend = GeminiBackend::new(&cfg, "k").unwrap();
    let mut client = RomaClient::builder()
        .backend(Arc::new(backend))
        .build()
        .unwrap();

    let result = client
        .submit_turn(TurnRequest::new("Light curtain fault, cell stopped"))
        .await
        .unwrap();
    assert_eq!(result.metadata.risk_level, Some(RiskLevel::Critical));
    assert!(!result.metadata.code_allowed);
}

#[tokio::test]
async fn quota_over_http_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(json!({ "error": { "message": "Quota exceeded for billing account" } }).to_string())
        .expect(1)
        .create_async()
        .await;

    let backend = GeminiBackend::new(&config(server.url()), "k").unwrap();
    let mut client = RomaClient::builder()
        .backend(Arc::new(backend))
        .build()
        .unwrap();

    let err = client
        .submit_turn(TurnRequest::new("Axis fault"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), BackendErrorKind::QuotaExceeded);
    assert_eq!(err.context().and_then(|c| c.status_code), Some(429));
    mock.assert_async().await;
}
