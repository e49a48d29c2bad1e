//! Local `llama.cpp` server adapter (spec.md §3.1, §4.3).
//!
//! `llama.cpp`'s `server` binary exposes an OpenAI-compatible
//! `/chat/completions` endpoint; no API key is ever sent.

use crate::http::openai_compatible_chat;
use async_trait::async_trait;
use denis_core::{CancellationToken, Engine, Message, ProviderAdapter, ProviderCallResult, ProviderFamily};
use std::collections::HashMap;
use std::time::Duration;

/// Adapter for local `llama.cpp` servers. Stateless: the endpoint and model
/// come from the [`Engine`] supplied per call.
#[derive(Debug, Clone)]
pub struct LlamaCppAdapter {
    http: reqwest::Client,
}

impl LlamaCppAdapter {
    /// Build a new adapter over a shared HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for LlamaCppAdapter {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl ProviderAdapter for LlamaCppAdapter {
    fn provider_family(&self) -> ProviderFamily {
        ProviderFamily::LlamaCpp
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn chat(
        &self,
        engine: &Engine,
        messages: &[Message],
        timeout: Duration,
        params: &HashMap<String, serde_json::Value>,
        cancel: CancellationToken,
    ) -> ProviderCallResult {
        openai_compatible_chat(
            &self.http,
            ProviderFamily::LlamaCpp,
            None,
            engine,
            messages,
            timeout,
            params,
            cancel,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denis_core::EngineId;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine(endpoint: &str) -> Engine {
        Engine::builder(EngineId::new("local1"), ProviderFamily::LlamaCpp)
            .endpoint(endpoint)
            .model("llama-3-8b-instruct")
            .tag(denis_core::engine::TAG_LOCAL)
            .build()
            .expect("valid engine")
    }

    #[tokio::test]
    async fn successful_call_returns_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .mount(&server)
            .await;

        let adapter = LlamaCppAdapter::default();
        let result = adapter
            .chat(
                &engine(&server.uri()),
                &[Message::user("hello")],
                Duration::from_secs(5),
                &HashMap::new(),
                CancellationToken::never(),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.response, "hi there");
        assert_eq!(result.input_tokens, 12);
        assert_eq!(result.output_tokens, 4);
    }

    #[tokio::test]
    async fn http_error_yields_terse_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let adapter = LlamaCppAdapter::default();
        let result = adapter
            .chat(
                &engine(&server.uri()),
                &[Message::user("hello")],
                Duration::from_secs(5),
                &HashMap::new(),
                CancellationToken::never(),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("llamacpp_http_503"));
    }

    #[tokio::test]
    async fn empty_completion_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let adapter = LlamaCppAdapter::default();
        let result = adapter
            .chat(
                &engine(&server.uri()),
                &[Message::user("hello")],
                Duration::from_secs(5),
                &HashMap::new(),
                CancellationToken::never(),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("llamacpp_empty_response"));
    }

    #[tokio::test]
    async fn cancellation_during_flight_yields_cancelled_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "too late"}}]
            })))
            .mount(&server)
            .await;

        let (source, token) = denis_core::CancellationSource::new();
        let adapter = LlamaCppAdapter::default();
        let target_engine = engine(&server.uri());
        let handle = tokio::spawn(async move {
            adapter
                .chat(
                    &target_engine,
                    &[Message::user("hello")],
                    Duration::from_secs(5),
                    &HashMap::new(),
                    token,
                )
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        source.cancel();
        let result = handle.await.expect("task did not panic");

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("cancelled"));
    }
}
