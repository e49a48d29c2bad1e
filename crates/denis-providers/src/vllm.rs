//! Self-hosted vLLM server adapter (spec.md §3.1, §4.3).
//!
//! vLLM's OpenAI-compatible server mode exposes the same
//! `/chat/completions` shape as `llama.cpp`; no API key is sent by default.

use crate::http::openai_compatible_chat;
use async_trait::async_trait;
use denis_core::{CancellationToken, Engine, Message, ProviderAdapter, ProviderCallResult, ProviderFamily};
use std::collections::HashMap;
use std::time::Duration;

/// Adapter for self-hosted vLLM servers.
#[derive(Debug, Clone)]
pub struct VllmAdapter {
    http: reqwest::Client,
}

impl VllmAdapter {
    /// Build a new adapter over a shared HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for VllmAdapter {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl ProviderAdapter for VllmAdapter {
    fn provider_family(&self) -> ProviderFamily {
        ProviderFamily::Vllm
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
            ProviderFamily::Vllm,
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

    #[tokio::test]
    async fn timeout_yields_terse_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let engine = Engine::builder(EngineId::new("vllm1"), ProviderFamily::Vllm)
            .endpoint(server.uri())
            .model("mistral-7b")
            .tag(denis_core::engine::TAG_LOCAL)
            .build()
            .expect("valid engine");

        let adapter = VllmAdapter::default();
        let result = adapter
            .chat(
                &engine,
                &[Message::user("hi")],
                Duration::from_millis(20),
                &HashMap::new(),
                CancellationToken::never(),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("vllm_timeout"));
    }
}
