//! Wiremock-based OpenAI-compatible mock servers for end-to-end tests.
//!
//! Mirrors `denis-providers`' own adapter-level wiremock tests, one level up:
//! these mount against a [`denis_routing::Router`] routing a real
//! [`denis_providers::LlamaCppAdapter`]/[`denis_providers::GroqAdapter`]
//! rather than calling the adapter directly.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a mock server that answers `/chat/completions` with a successful
/// completion.
pub async fn mock_chat_success(content: &str, input_tokens: u32, output_tokens: u32) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": input_tokens, "completion_tokens": output_tokens},
        })))
        .mount(&server)
        .await;
    server
}

/// Start a mock server that answers `/chat/completions` with a given HTTP
/// status and no body.
pub async fn mock_chat_error(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// Start a mock server that never answers within `delay`, to exercise the
/// router's timeout path.
pub async fn mock_chat_slow(content: &str, delay: std::time::Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}],
                    "usage": {"prompt_tokens": 1, "completion_tokens": 1},
                }))
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}
