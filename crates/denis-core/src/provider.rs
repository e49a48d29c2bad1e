//! The provider adapter contract (spec.md §4.3).
//!
//! One adapter instance serves every [`Engine`] of its
//! [`ProviderFamily`](crate::engine::ProviderFamily); the engine supplies the
//! per-call endpoint, model, and cost factor. Per spec.md §9 Design Notes
//! ("Coroutines → task graph"): the router is a single asynchronous function
//! whose only suspension point is this call.

use crate::cancel::CancellationToken;
use crate::engine::{Engine, ProviderFamily};
use crate::request::Message;
use crate::result::ProviderCallResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A single contract shared by every backend family (spec.md §4.3).
///
/// Implementations must never throw across this boundary: a rejected,
/// timed-out, or malformed call is folded into a failed
/// [`ProviderCallResult`], never a panic or a propagated error.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Canonical family identifier this adapter serves.
    fn provider_family(&self) -> ProviderFamily;

    /// Cheap, non-blocking reachability check. Does not guarantee the next
    /// `chat` call succeeds; it is a fast pre-filter only.
    fn is_available(&self) -> bool;

    /// Deterministic, multiplicative cost estimate from the engine's
    /// registered `cost_factor`.
    fn estimate_cost(&self, engine: &Engine, input_tokens: u32, output_tokens: u32) -> f64 {
        let total_tokens = f64::from(input_tokens + output_tokens);
        (total_tokens / 1000.0) * engine.cost_factor
    }

    /// Execute one chat call against `engine`.
    ///
    /// Implementations must:
    ///   - honor `timeout` exactly;
    ///   - race the call against `cancel` and return a failed result with
    ///     reason `cancelled` as soon as it fires (spec.md §5, §7);
    ///   - measure `latency_ms` with a monotonic clock around the whole call;
    ///   - copy token counts from backend usage when provided, else zero;
    ///   - propagate the loop-guard `Hop` header on the outbound request;
    ///   - never leak secrets into `error` or `raw`.
    async fn chat(
        &self,
        engine: &Engine,
        messages: &[Message],
        timeout: Duration,
        params: &HashMap<String, serde_json::Value>,
        cancel: CancellationToken,
    ) -> ProviderCallResult;
}
