use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use taskboard_core::{Priority, PrioritySuggestion};
use taskboard_server::assist::{
    AssistError, CompletionService, OpenAiCompletionService, Prioritization, Summary,
};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::TestApp;

fn openai_service(server: &MockServer) -> OpenAiCompletionService {
    OpenAiCompletionService::new(
        "test-api-key".to_string(),
        format!("{}/", server.uri()),
        "test-model".to_string(),
    )
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

/// Completion backend answering every prompt with the same text.
struct FixedCompletion(&'static str);

#[async_trait]
impl CompletionService for FixedCompletion {
    async fn complete(&self, _prompt: String) -> Result<String, AssistError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn openai_service_sends_chat_completion_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("test-api-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let completion = openai_service(&server)
        .complete("Hello".to_string())
        .await
        .expect("Completion failed");

    assert_eq!(completion, "Hi there");
}

#[tokio::test]
async fn openai_service_reports_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
        .mount(&server)
        .await;

    let result = openai_service(&server).complete("Hello".to_string()).await;

    match result {
        Err(AssistError::Upstream { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "Rate limit exceeded");
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn openai_service_rejects_empty_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = openai_service(&server).complete("Hello".to_string()).await;

    assert!(matches!(result, Err(AssistError::EmptyCompletion)));
}

#[tokio::test]
async fn prioritize_endpoint_filters_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "```json\n[{\"id\": 1, \"newPriority\": \"P1\"}, {\"id\": 7, \"newPriority\": \"P2\"}]\n```",
        )))
        .mount(&server)
        .await;
    let app = TestApp::with_completion(Arc::new(openai_service(&server))).await;
    let token = app.token_for("Alice", "alice@example.com").await;

    let (status, outcome) = app
        .send_json::<Prioritization>(
            "POST",
            "/api/assist/prioritize",
            Some(&token),
            Some(json!({"tasks": [
                {"id": 1, "title": "Fix login bug", "priority": "P3"},
                {"id": 2, "title": "Update docs"}
            ]})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        outcome,
        Prioritization {
            results: vec![PrioritySuggestion {
                id: 1,
                new_priority: Priority::P1
            }],
            degraded: false,
        }
    );
}

#[tokio::test]
async fn assist_endpoints_degrade_when_upstream_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    let app = TestApp::with_completion(Arc::new(openai_service(&server))).await;
    let token = app.token_for("Alice", "alice@example.com").await;
    let body = json!({"tasks": [{"id": 1, "title": "Fix login bug"}]});

    let (status, summary) = app
        .send_json::<Summary>("POST", "/api/assist/summarize", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary,
        Summary {
            summary: String::new(),
            degraded: true
        }
    );

    let (status, outcome) = app
        .send_json::<Prioritization>("POST", "/api/assist/prioritize", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(outcome.results.is_empty());
    assert!(outcome.degraded);
}

#[tokio::test]
async fn summarize_endpoint_returns_completion() {
    let app = TestApp::with_completion(Arc::new(FixedCompletion("One bug to fix."))).await;
    let token = app.token_for("Alice", "alice@example.com").await;

    let (status, summary) = app
        .send_json::<Summary>(
            "POST",
            "/api/assist/summarize",
            Some(&token),
            Some(json!({"tasks": [{"id": 1, "title": "Fix login bug", "description": "Urgent"}]})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary.summary, "One bug to fix.");
    assert!(!summary.degraded);
}

#[tokio::test]
async fn assist_endpoints_require_authentication() {
    let app = TestApp::with_completion(Arc::new(FixedCompletion("unused"))).await;

    let (status, _) = app
        .send("POST", "/api/assist/summarize", None, Some(json!({"tasks": []})))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
