//! OpenRouter aggregator adapter (spec.md §3.1, §4.3).

use crate::http::openai_compatible_chat;
use async_trait::async_trait;
use denis_core::{CancellationToken, Engine, Message, ProviderAdapter, ProviderCallResult, ProviderFamily};
use std::collections::HashMap;
use std::time::Duration;

/// Adapter for OpenRouter's OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl OpenRouterAdapter {
    /// Build a new adapter over a shared HTTP client and optional API key.
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn provider_family(&self) -> ProviderFamily {
        ProviderFamily::OpenRouter
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
            ProviderFamily::OpenRouter,
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
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn successful_call_propagates_cost_estimate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}],
                "usage": {"prompt_tokens": 100, "completion_tokens": 100}
            })))
            .mount(&server)
            .await;

        let engine = Engine::builder(EngineId::new("or1"), ProviderFamily::OpenRouter)
            .endpoint(server.uri())
            .model("anthropic/claude-3-haiku")
            .cost_factor(1.5)
            .build()
            .expect("valid engine");

        let adapter = OpenRouterAdapter::new(reqwest::Client::new(), Some("key".to_string()));
        let result = adapter
            .chat(
                &engine,
                &[Message::user("hi")],
                Duration::from_secs(5),
                &HashMap::new(),
                CancellationToken::never(),
            )
            .await;

        assert!(result.success);
        assert!((result.cost_usd_estimated - 0.3).abs() < 1e-9);
    }
}
