//! The engine catalog record (spec.md §3.1).

use crate::error::{DenisError, DenisResult};
use crate::types::EngineId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;

/// One of the closed set of backend families the control plane knows how to
/// adapt to. Per spec.md §9 Design Notes ("Dynamic dispatch → tagged
/// variants"): the set of providers is small and closed, so it is a plain
/// enum rather than an open trait-object hierarchy at the registry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    /// Local `llama.cpp` server.
    LlamaCpp,
    /// Groq cloud inference.
    Groq,
    /// OpenRouter aggregator.
    OpenRouter,
    /// Anthropic Claude API.
    Anthropic,
    /// Self-hosted vLLM server.
    Vllm,
    /// Perplexity search-augmented models.
    Perplexity,
}

impl ProviderFamily {
    /// Canonical lowercase identifier, used in error/trace strings
    /// (e.g. `<family>_http_<status>`, spec.md §4.3).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LlamaCpp => "llamacpp",
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
            Self::Anthropic => "anthropic",
            Self::Vllm => "vllm",
            Self::Perplexity => "perplexity",
        }
    }

    /// Parse a provider family from its canonical string, as read from a
    /// registry descriptor. `None` on unknown family — callers decide
    /// whether that is a hard failure (`DENIS_STRICT_ENGINE_REGISTRY=1`) or
    /// a fail-open drop (spec.md §4.1, §7).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "llamacpp" => Some(Self::LlamaCpp),
            "groq" => Some(Self::Groq),
            "openrouter" => Some(Self::OpenRouter),
            "anthropic" => Some(Self::Anthropic),
            "vllm" => Some(Self::Vllm),
            "perplexity" => Some(Self::Perplexity),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recognized routing tag (spec.md §3.1). Unrecognized tags are kept as
/// free-form metadata and never influence scheduling.
pub const TAG_LOCAL: &str = "local";
/// Engine must not be used while Internet Health ≠ `OK`.
pub const TAG_INTERNET_REQUIRED: &str = "internet_required";
/// Engine is eligible for fast/low-latency task profiles.
pub const TAG_FAST: &str = "fast";
/// Engine is a cloud "booster" in gateway-router terminology.
pub const TAG_BOOSTER: &str = "booster";

/// A free-form routing tag attached to an [`Engine`].
pub type Tag = String;

/// One addressable LLM backend (spec.md §3.1). Immutable after registry load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    /// Unique key, used in plans.
    pub engine_id: EngineId,
    /// Backend family; determines which [`ProviderAdapter`](crate::provider::ProviderAdapter) handles it.
    pub provider_family: ProviderFamily,
    /// Absolute URL or scheme-prefixed URI identifying the server or gateway.
    pub endpoint: String,
    /// Backend's model identifier, opaque to the core.
    pub model: String,
    /// Lower is preferred. Ties broken by `engine_id` lexicographic order.
    pub priority: u32,
    /// Routing tags (see `TAG_*` constants).
    pub tags: HashSet<Tag>,
    /// Maximum context window, in tokens.
    pub max_context: u32,
    /// Maximum output tokens the backend allows per call.
    pub max_output: u32,
    /// USD per 1K total tokens; zero disables cost estimation.
    pub cost_factor: f64,
    /// Default params merged under plan-supplied params.
    pub default_params: HashMap<String, serde_json::Value>,
}

impl Engine {
    /// Start building an [`Engine`].
    #[must_use]
    pub fn builder(engine_id: impl Into<EngineId>, provider_family: ProviderFamily) -> EngineBuilder {
        EngineBuilder::new(engine_id, provider_family)
    }

    /// True if this engine carries [`TAG_LOCAL`].
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.tags.contains(TAG_LOCAL)
    }

    /// True if this engine carries [`TAG_INTERNET_REQUIRED`].
    #[must_use]
    pub fn requires_internet(&self) -> bool {
        self.tags.contains(TAG_INTERNET_REQUIRED)
    }
}

/// Builder for [`Engine`], following the validated-newtype/builder idiom used
/// throughout this crate.
#[derive(Debug)]
pub struct EngineBuilder {
    engine_id: EngineId,
    provider_family: ProviderFamily,
    endpoint: Option<String>,
    model: Option<String>,
    priority: u32,
    tags: HashSet<Tag>,
    max_context: u32,
    max_output: u32,
    cost_factor: f64,
    default_params: HashMap<String, serde_json::Value>,
}

impl EngineBuilder {
    /// Start a new builder for the given id and provider family.
    #[must_use]
    pub fn new(engine_id: impl Into<EngineId>, provider_family: ProviderFamily) -> Self {
        Self {
            engine_id: engine_id.into(),
            provider_family,
            endpoint: None,
            model: None,
            priority: 0,
            tags: HashSet::new(),
            max_context: 4096,
            max_output: 512,
            cost_factor: 0.0,
            default_params: HashMap::new(),
        }
    }

    /// Set the endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the backend model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the priority (lower preferred).
    #[must_use]
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a single tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add several tags at once.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<Tag>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set `max_context`.
    #[must_use]
    pub fn max_context(mut self, max_context: u32) -> Self {
        self.max_context = max_context;
        self
    }

    /// Set `max_output`.
    #[must_use]
    pub fn max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }

    /// Set the per-1K-token USD cost factor.
    #[must_use]
    pub fn cost_factor(mut self, cost_factor: f64) -> Self {
        self.cost_factor = cost_factor;
        self
    }

    /// Merge in a default param.
    #[must_use]
    pub fn default_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.default_params.insert(key.into(), value);
        self
    }

    /// Build the engine, validating spec.md §3.1 invariants that are
    /// checkable in isolation (registry-wide uniqueness is checked by
    /// [`EngineRegistry`](crate::registry::EngineRegistry) at load time).
    ///
    /// # Errors
    /// Returns [`DenisError::InvalidRequest`] if required fields are missing.
    pub fn build(self) -> DenisResult<Engine> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| DenisError::invalid_field("endpoint", "endpoint is required"))?;
        let model = self
            .model
            .ok_or_else(|| DenisError::invalid_field("model", "model is required"))?;

        if self.cost_factor < 0.0 {
            return Err(DenisError::invalid_field(
                "cost_factor",
                "cost_factor must be >= 0",
            ));
        }

        Ok(Engine {
            engine_id: self.engine_id,
            provider_family: self.provider_family,
            endpoint,
            model,
            priority: self.priority,
            tags: self.tags,
            max_context: self.max_context,
            max_output: self.max_output,
            cost_factor: self.cost_factor,
            default_params: self.default_params,
        })
    }
}
