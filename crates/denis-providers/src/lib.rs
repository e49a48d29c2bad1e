//! # Denis Providers
//!
//! Provider adapters for the Denis inference control plane (spec.md §4.3).
//!
//! Every adapter here implements [`denis_core::ProviderAdapter`] and is
//! stateless with respect to any single engine: one instance serves every
//! [`denis_core::Engine`] of its family, since the endpoint, model, and cost
//! factor travel on each call. Five of the six families
//! (`llamacpp`, `groq`, `openrouter`, `vllm`, `perplexity`) share the
//! OpenAI-compatible `/chat/completions` transport in [`http`]; `anthropic`
//! implements its own Messages-API wire format.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod groq;
pub mod http;
pub mod llamacpp;
pub mod openrouter;
pub mod perplexity;
pub mod vllm;

pub use anthropic::AnthropicAdapter;
pub use groq::GroqAdapter;
pub use llamacpp::LlamaCppAdapter;
pub use openrouter::OpenRouterAdapter;
pub use perplexity::PerplexityAdapter;
pub use vllm::VllmAdapter;

use denis_core::{ProviderAdapter, ProviderFamily};
use std::sync::Arc;

/// API keys for the families that need one, read once at startup and
/// handed to [`build_adapters`]. A missing key is not an error: the
/// corresponding adapter reports `is_available() == false` and the
/// scheduler/router skip it (spec.md §4.1, §7).
#[derive(Debug, Clone, Default)]
pub struct ProviderApiKeys {
    /// Groq API key.
    pub groq: Option<String>,
    /// OpenRouter API key.
    pub openrouter: Option<String>,
    /// Anthropic API key.
    pub anthropic: Option<String>,
    /// Perplexity API key.
    pub perplexity: Option<String>,
}

/// Build one adapter instance per [`ProviderFamily`], sharing a single
/// [`reqwest::Client`] across all of them. Per spec.md §9 Design Notes
/// ("Dynamic dispatch → tagged variants"), the caller still matches on
/// [`ProviderFamily`] to pick an adapter out of this map rather than going
/// through an open-ended registry of trait objects.
#[must_use]
pub fn build_adapters(
    http: reqwest::Client,
    keys: &ProviderApiKeys,
) -> Vec<(ProviderFamily, Arc<dyn ProviderAdapter>)> {
    vec![
        (
            ProviderFamily::LlamaCpp,
            Arc::new(LlamaCppAdapter::new(http.clone())) as Arc<dyn ProviderAdapter>,
        ),
        (
            ProviderFamily::Groq,
            Arc::new(GroqAdapter::new(http.clone(), keys.groq.clone())),
        ),
        (
            ProviderFamily::OpenRouter,
            Arc::new(OpenRouterAdapter::new(http.clone(), keys.openrouter.clone())),
        ),
        (
            ProviderFamily::Anthropic,
            Arc::new(AnthropicAdapter::new(http.clone(), keys.anthropic.clone())),
        ),
        (ProviderFamily::Vllm, Arc::new(VllmAdapter::new(http.clone()))),
        (
            ProviderFamily::Perplexity,
            Arc::new(PerplexityAdapter::new(http, keys.perplexity.clone())),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_adapters_covers_every_family() {
        let adapters = build_adapters(reqwest::Client::new(), &ProviderApiKeys::default());
        let families: std::collections::HashSet<_> = adapters.iter().map(|(f, _)| *f).collect();
        assert_eq!(families.len(), 6);
    }
}
