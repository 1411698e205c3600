//! OpenAI-compatible backend tests against a mock HTTP server
//!
//! Validates request shape, headers, response extraction and error mapping.

use std::time::Duration;

use aiface::backend::{BackendClient, OpenAiBackend, OpenAiConfig, RetryPolicy};
use aiface::error::BackendError;
use aiface::prelude::*;
use aiface::prompt::BackendRequest;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ],
        "usage": { "prompt_tokens": 42, "completion_tokens": 1, "total_tokens": 43 }
    })
}

fn config(server: &MockServer) -> OpenAiConfig {
    OpenAiConfig::new("test-key").with_base_url(format!("{}/v1", server.uri()))
}

#[tokio::test]
async fn request_shape_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(|req: &Request| {
            let Ok(v) = serde_json::from_slice::<serde_json::Value>(&req.body) else {
                return false;
            };
            v["model"] == "gpt-4o"
                && v["messages"][0]["role"] == "system"
                && v["messages"][1]["role"] == "user"
                && v["messages"][1]["content"] == "what is 1 + 2?"
                && v["temperature"] == 0.0
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("3")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config(&server).with_temperature(0.0)).unwrap();
    let request = BackendRequest::new("answer tersely", "what is 1 + 2?").with_model("gpt-4o");
    let response = backend.send(&request).await.expect("chat ok");

    assert_eq!(response.text, "3");
    assert_eq!(response.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
    assert_eq!(response.usage.map(|u| u.total_tokens), Some(43));
}

#[tokio::test]
async fn configured_model_is_used_when_request_has_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(|req: &Request| {
            serde_json::from_slice::<serde_json::Value>(&req.body)
                .map(|v| v["model"] == "my-model" && v.get("max_tokens").is_none())
                .unwrap_or(false)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("true")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config(&server).with_model("my-model")).unwrap();
    let response = backend.send(&BackendRequest::new("s", "u")).await.unwrap();
    assert_eq!(response.text, "true");
}

#[tokio::test]
async fn http_errors_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer bad-key"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(serde_json::json!({
                    "error": { "message": "Rate limit reached", "type": "requests" }
                })),
        )
        .mount(&server)
        .await;

    let request = BackendRequest::new("s", "u");

    let bad = OpenAiBackend::new(
        OpenAiConfig::new("bad-key").with_base_url(format!("{}/v1", server.uri())),
    )
    .unwrap();
    let err = bad.send(&request).await.unwrap_err();
    assert!(matches!(err, BackendError::AuthenticationError(_)), "{err:?}");

    let throttled = OpenAiBackend::new(config(&server)).unwrap();
    let err = throttled.send(&request).await.unwrap_err();
    assert!(matches!(err, BackendError::RateLimitError(_)), "{err:?}");
    assert!(err.is_retryable());
}

fn rate_limit_exceeded_body() -> serde_json::Value {
    serde_json::json!({
        "error": {
            "message": "Rate limit reached for gpt-4o-mini in organization org-123 on requests per min (RPM): Limit 3, Used 3, Requested 1. Please try again in 20s.",
            "type": "requests",
            "param": null,
            "code": "rate_limit_exceeded"
        }
    })
}

#[tokio::test]
async fn openai_rate_limit_body_is_retryable_not_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_exceeded_body()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("7")))
        .mount(&server)
        .await;

    let once = OpenAiBackend::new(config(&server)).unwrap();
    let err = once.send(&BackendRequest::new("s", "u")).await.unwrap_err();
    assert!(matches!(err, BackendError::RateLimitError(_)), "{err:?}");
    assert!(err.is_retryable());

    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_exceeded_body()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("7")))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RetryPolicy::new()
        .with_max_attempts(2)
        .with_initial_delay(Duration::from_millis(5))
        .with_jitter(false);
    let retrying = OpenAiBackend::new(config(&server).with_retry(policy)).unwrap();
    let response = retrying.send(&BackendRequest::new("s", "u")).await.unwrap();
    assert_eq!(response.text, "7");
}

#[tokio::test]
async fn insufficient_quota_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "type": "insufficient_quota",
                "param": null,
                "code": "insufficient_quota"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(5))
        .with_jitter(false);
    let backend = OpenAiBackend::new(config(&server).with_retry(policy)).unwrap();
    let err = backend.send(&BackendRequest::new("s", "u")).await.unwrap_err();
    assert!(matches!(err, BackendError::QuotaExceededError(_)), "{err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn empty_choices_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "x", "choices": []
        })))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config(&server)).unwrap();
    let err = backend.send(&BackendRequest::new("s", "u")).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn retry_policy_recovers_from_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("42")))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RetryPolicy::new()
        .with_max_attempts(2)
        .with_initial_delay(Duration::from_millis(5))
        .with_jitter(false);
    let backend = OpenAiBackend::new(config(&server).with_retry(policy)).unwrap();
    let response = backend.send(&BackendRequest::new("s", "u")).await.unwrap();
    assert_eq!(response.text, "42");
}

#[tokio::test]
async fn proxy_over_openai_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(|req: &Request| {
            let Ok(v) = serde_json::from_slice::<serde_json::Value>(&req.body) else {
                return false;
            };
            let user = v["messages"][1]["content"].as_str().unwrap_or_default();
            user.contains("method: sum") && user.contains("- a (i64) = 1")
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("The sum is 3.")))
        .expect(1)
        .mount(&server)
        .await;

    let factory = ProxyFactory::openai(config(&server)).unwrap();
    let proxy = factory
        .create(
            InterfaceDescriptor::builder("Calculator")
                .method(
                    MethodDescriptor::new("sum", SemanticType::Int(IntKind::I64))
                        .param("a", SemanticType::Int(IntKind::I64))
                        .param("b", SemanticType::Int(IntKind::I64)),
                )
                .build(),
        )
        .unwrap();

    let out: i64 = proxy
        .invoke_typed("sum", &[1i64.into(), 2i64.into()])
        .await
        .unwrap();
    assert_eq!(out, 3);
}
