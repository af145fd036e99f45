#![allow(clippy::unwrap_used, clippy::expect_used)]

use docbridge_core::Turn;
use docbridge_engine::{
    AiProvider, CompletionBackend, OpenAiBackend, ProviderConfig, ServingBackend,
};
use std::collections::HashMap;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(provider: AiProvider, base_url: Option<String>) -> ProviderConfig {
    ProviderConfig {
        provider,
        model_id: "serving-v1".to_string(),
        api_key: "sk-test".to_string(),
        api_base_url: base_url,
        temperature: 0.3,
        max_tokens: 256,
        max_history_turns: 20,
        max_document_chars: 24_000,
    }
}

fn completion_body() -> serde_json::Value {
    serde_json::json!({
        "model": "serving-v1",
        "choices": [{"message": {"role": "assistant", "content": "It is a report."}}],
        "usage": {"prompt_tokens": 42, "completion_tokens": 5},
    })
}

#[tokio::test]
async fn test_serving_backend_invokes_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/serving-endpoints/serving-v1/invocations"))
        .and(header("Authorization", "Bearer workspace-token"))
        .and(body_partial_json(serde_json::json!({
            "max_tokens": 256,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = ServingBackend::new(
        provider_config(AiProvider::Workspace, None),
        server.uri(),
        "workspace-token",
    );
    let completion = backend
        .complete(b"%PDF-1.7 content", "What is this?", &[])
        .await
        .unwrap();

    assert_eq!(completion.answer, "It is a report.");
    assert_eq!(completion.metadata["model"], "serving-v1");
    assert_eq!(completion.metadata["usage"]["prompt_tokens"], 42);
}

#[tokio::test]
async fn test_serving_backend_surfaces_remote_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/serving-endpoints/serving-v1/invocations"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": "endpoint scaling up",
        })))
        .mount(&server)
        .await;

    let backend = ServingBackend::new(
        provider_config(AiProvider::Workspace, None),
        server.uri(),
        "workspace-token",
    );
    let err = backend.complete(b"doc", "q", &[]).await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_openai_backend_replays_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "serving-v1",
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "earlier question"},
                {"role": "assistant", "content": "earlier answer"},
                {"role": "user", "content": "follow-up"},
            ],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(provider_config(
        AiProvider::OpenAi,
        Some(server.uri()),
    ));
    let history = vec![Turn::new(
        "earlier question",
        "earlier answer",
        HashMap::new(),
    )];
    let completion = backend
        .complete(b"doc", "follow-up", &history)
        .await
        .unwrap();
    assert_eq!(completion.answer, "It is a report.");
}
