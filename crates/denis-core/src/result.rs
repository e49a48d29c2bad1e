//! The provider call result envelope (spec.md §3.5).

use crate::engine::ProviderFamily;
use crate::types::EngineId;
use serde::{Deserialize, Serialize};

/// `{provider_family, engine_id, model, response, input_tokens,
/// output_tokens, latency_ms, cost_usd_estimated, raw?, error?, success}`
/// (spec.md §3.5).
///
/// Exactly one of `(response non-empty, success=true)` or `(error set,
/// success=false)` holds — enforced by only constructing this type through
/// [`Self::success`]/[`Self::failure`], never by setting fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCallResult {
    /// Backend family that produced this result.
    pub provider_family: ProviderFamily,
    /// Engine that was called.
    pub engine_id: EngineId,
    /// Backend model identifier actually used.
    pub model: String,
    /// Generated text. Empty on failure.
    pub response: String,
    /// Prompt tokens, copied from backend usage or zero if unreported.
    pub input_tokens: u32,
    /// Completion tokens, copied from backend usage or zero if unreported.
    pub output_tokens: u32,
    /// Wall-clock latency of the whole call, measured with a monotonic clock.
    pub latency_ms: u64,
    /// Estimated cost, in USD, from token counts × `cost_factor`.
    pub cost_usd_estimated: f64,
    /// Raw backend payload, for debugging. Never contains secrets
    /// (spec.md §4.3: "never leak secrets into `error` or `raw`").
    pub raw: Option<serde_json::Value>,
    /// Terse error code (spec.md §4.3: `<family>_http_<status>`,
    /// `<family>_empty_response`, `<family>_timeout`, `exception:<first line>`).
    pub error: Option<String>,
    /// `true` iff this call produced a usable response.
    pub success: bool,
}

impl ProviderCallResult {
    /// Build a successful result.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn success(
        provider_family: ProviderFamily,
        engine_id: EngineId,
        model: impl Into<String>,
        response: impl Into<String>,
        input_tokens: u32,
        output_tokens: u32,
        latency_ms: u64,
        cost_usd_estimated: f64,
        raw: Option<serde_json::Value>,
    ) -> Self {
        Self {
            provider_family,
            engine_id,
            model: model.into(),
            response: response.into(),
            input_tokens,
            output_tokens,
            latency_ms,
            cost_usd_estimated,
            raw,
            error: None,
            success: true,
        }
    }

    /// Build a failed result. `error` should follow the terse code format
    /// named in spec.md §4.3.
    #[must_use]
    pub fn failure(
        provider_family: ProviderFamily,
        engine_id: EngineId,
        model: impl Into<String>,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            provider_family,
            engine_id,
            model: model.into(),
            response: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            latency_ms,
            cost_usd_estimated: 0.0,
            raw: None,
            error: Some(error.into()),
            success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_has_no_error() {
        let result = ProviderCallResult::success(
            ProviderFamily::LlamaCpp,
            EngineId::new("L1"),
            "llama-3-8b",
            "hello",
            10,
            5,
            42,
            0.0,
            None,
        );
        assert!(result.success);
        assert!(result.error.is_none());
        assert!(!result.response.is_empty());
    }

    #[test]
    fn failure_result_has_empty_response() {
        let result = ProviderCallResult::failure(
            ProviderFamily::Groq,
            EngineId::new("B1"),
            "llama-3-70b",
            "groq_timeout",
            5000,
        );
        assert!(!result.success);
        assert!(result.response.is_empty());
        assert_eq!(result.error.as_deref(), Some("groq_timeout"));
    }
}
