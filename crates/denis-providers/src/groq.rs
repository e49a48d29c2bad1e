//! Groq cloud inference adapter (spec.md §3.1, §4.3).

use crate::http::openai_compatible_chat;
use async_trait::async_trait;
use denis_core::{CancellationToken, Engine, Message, ProviderAdapter, ProviderCallResult, ProviderFamily};
use std::collections::HashMap;
use std::time::Duration;

/// Adapter for the Groq API. Stateless aside from the shared HTTP client and
/// bearer token; endpoint and model come from the [`Engine`] per call.
#[derive(Debug, Clone)]
pub struct GroqAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl GroqAdapter {
    /// Build a new adapter. `api_key` is `None` when the booster is
    /// configured but unreachable (`is_available` then reports `false`).
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl ProviderAdapter for GroqAdapter {
    fn provider_family(&self) -> ProviderFamily {
        ProviderFamily::Groq
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
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
            ProviderFamily::Groq,
            self.api_key.as_deref(),
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
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine(endpoint: &str) -> Engine {
        Engine::builder(EngineId::new("groq1"), ProviderFamily::Groq)
            .endpoint(endpoint)
            .model("llama-3-70b")
            .tag(denis_core::engine::TAG_BOOSTER)
            .build()
            .expect("valid engine")
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let adapter = GroqAdapter::new(reqwest::Client::new(), Some("secret-key".to_string()));
        let result = adapter
            .chat(
                &engine(&server.uri()),
                &[Message::user("hi")],
                Duration::from_secs(5),
                &HashMap::new(),
                CancellationToken::never(),
            )
            .await;

        assert!(result.success);
    }

    #[test]
    fn unavailable_without_api_key() {
        let adapter = GroqAdapter::new(reqwest::Client::new(), None);
        assert!(!adapter.is_available());
    }
}
