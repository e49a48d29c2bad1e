//! Perplexity search-augmented model adapter (spec.md §3.1, §4.3).

use crate::http::openai_compatible_chat;
use async_trait::async_trait;
use denis_core::{CancellationToken, Engine, Message, ProviderAdapter, ProviderCallResult, ProviderFamily};
use std::collections::HashMap;
use std::time::Duration;

/// Adapter for Perplexity's `sonar`-family models, served behind the same
/// OpenAI-compatible `/chat/completions` shape as the other cloud boosters.
#[derive(Debug, Clone)]
pub struct PerplexityAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl PerplexityAdapter {
    /// Build a new adapter over a shared HTTP client and optional API key.
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    fn provider_family(&self) -> ProviderFamily {
        ProviderFamily::Perplexity
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
            ProviderFamily::Perplexity,
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

    #[test]
    fn unavailable_without_api_key() {
        let adapter = PerplexityAdapter::new(reqwest::Client::new(), None);
        assert!(!adapter.is_available());
    }

    #[test]
    fn estimate_cost_uses_engine_cost_factor() {
        let adapter = PerplexityAdapter::new(reqwest::Client::new(), Some("k".to_string()));
        let engine = Engine::builder(EngineId::new("pplx1"), ProviderFamily::Perplexity)
            .endpoint("https://api.perplexity.ai")
            .model("sonar-pro")
            .cost_factor(5.0)
            .build()
            .expect("valid engine");
        assert!((adapter.estimate_cost(&engine, 500, 500) - 5.0).abs() < 1e-9);
    }
}
