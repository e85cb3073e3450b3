use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use generation_cell::{
    ChatMessage, FailoverGenerator, GenerationError, GenerationOutcome, OpenAiCompatProvider,
    TextGenerator, ToolSchema,
};

fn text_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn transient_status_is_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("안녕하세요")))
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::new("primary", server.uri(), "key", "test-model");
    let reply = provider.complete("system", "안녕", 0.3).await.unwrap();
    assert_eq!(reply, "안녕하세요");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::new("primary", server.uri(), "key", "test-model");
    let result = provider.complete("system", "안녕", 0.3).await;
    assert_matches!(result, Err(GenerationError::Upstream(_)));
}

#[tokio::test]
async fn failover_moves_to_secondary_when_primary_exhausts() {
    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&broken)
        .await;

    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("보조 응답")))
        .mount(&healthy)
        .await;

    let generator = FailoverGenerator::new(vec![
        (
            "primary".to_string(),
            Arc::new(OpenAiCompatProvider::new("primary", broken.uri(), "key", "m1"))
                as Arc<dyn TextGenerator>,
        ),
        (
            "secondary".to_string(),
            Arc::new(OpenAiCompatProvider::new("secondary", healthy.uri(), "key", "m2"))
                as Arc<dyn TextGenerator>,
        ),
    ]);
    let reply = generator.complete("system", "질문", 0.3).await.unwrap();
    assert_eq!(reply, "보조 응답");
}

#[tokio::test]
async fn tool_call_response_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "wait_status",
                            "arguments": "{\"department\": \"내과\"}"
                        }
                    }]
                }
            }]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::new("primary", server.uri(), "key", "test-model");
    let outcome = provider
        .complete_with_tools(
            vec![ChatMessage::user("내과 대기 얼마나 돼?")],
            &[ToolSchema {
                name: "wait_status".to_string(),
                description: "대기 현황 조회".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            }],
        )
        .await
        .unwrap();

    match outcome {
        GenerationOutcome::ToolCalls(calls) => {
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].name, "wait_status");
            assert_eq!(calls[0].arguments["department"], "내과");
        }
        GenerationOutcome::Text(t) => panic!("expected tool calls, got text: {t}"),
    }
}
