//! HTTP-level tests for the OpenAI-compatible adapter and the title
//! generator built on it.

use std::sync::Arc;

use pl_domain::config::{LlmConfig, TitleConfig};
use pl_domain::error::Error;
use pl_domain::tool::Message;
use pl_providers::{ChatRequest, LlmProvider, LlmTitleGenerator, OpenAiCompatProvider, TitleGenerator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, api_key_env: &str) -> LlmConfig {
    LlmConfig {
        base_url: format!("{}/v1", server.uri()),
        api_key_env: api_key_env.into(),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
    })
}

#[tokio::test]
async fn chat_sends_bearer_token_and_parses_reply() {
    let server = MockServer::start().await;
    let env_var = "PL_WIRE_TEST_KEY_1702";
    std::env::set_var(env_var, "sk-wire");

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-wire"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello!")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::from_config(&config(&server, env_var)).unwrap();
    let resp = provider
        .chat(&ChatRequest {
            messages: vec![Message::user("hi")],
            ..Default::default()
        })
        .await
        .unwrap();
    std::env::remove_var(env_var);

    assert_eq!(resp.content, "Hello!");
    assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    assert_eq!(resp.usage.map(|u| u.total_tokens), Some(16));
}

#[tokio::test]
async fn non_success_status_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider =
        OpenAiCompatProvider::from_config(&config(&server, "PL_WIRE_UNSET_KEY_0001")).unwrap();
    let err = provider
        .chat(&ChatRequest {
            messages: vec![Message::user("hi")],
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        Error::Provider { message, .. } => assert_eq!(message, "HTTP 429 - rate limited"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn title_generator_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r#"{"title": "Refactoring Plan"}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiCompatProvider::from_config(&config(&server, "PL_WIRE_UNSET_KEY_0002")).unwrap());
    let generator = LlmTitleGenerator::new(provider, &TitleConfig::default());

    let title = generator
        .generate(&[
            Message::user("How should we split the parser module?"),
            Message::assistant("Start by extracting the lexer."),
        ])
        .await
        .unwrap();
    assert_eq!(title, "Refactoring Plan");
}

#[tokio::test]
async fn title_generator_rejects_non_json_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Refactoring Plan")))
        .mount(&server)
        .await;

    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiCompatProvider::from_config(&config(&server, "PL_WIRE_UNSET_KEY_0003")).unwrap());
    let generator = LlmTitleGenerator::new(provider, &TitleConfig::default());

    let err = generator
        .generate(&[Message::user("a"), Message::assistant("b")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
