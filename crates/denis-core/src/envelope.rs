//! The router's response envelope (spec.md §4.6, §8.1 invariant 8).

use crate::health::InternetStatus;
use crate::plan::InferencePlan;
use crate::types::EngineId;
use serde::{Deserialize, Serialize};

/// One engine the router considered but did not attempt (spec.md §4.1,
/// §4.6). Skipped engines never decrement `attempt_policy.max_attempts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEngine {
    /// The engine id that was skipped (may not resolve in the registry).
    pub engine_id: String,
    /// Short snake_case reason code (spec.md §4.7), e.g.
    /// `engine_not_found_in_registry`, `no_internet`.
    pub reason: String,
    /// `true` when the skip reflects a registry misconfiguration rather
    /// than a routine policy gate.
    pub misconfig: bool,
}

impl SkippedEngine {
    /// Build a skip record for an engine absent from the registry.
    #[must_use]
    pub fn not_found_in_registry(engine_id: impl Into<String>) -> Self {
        Self {
            engine_id: engine_id.into(),
            reason: "engine_not_found_in_registry".to_string(),
            misconfig: true,
        }
    }

    /// Build a skip record for an internet-gated engine while offline.
    #[must_use]
    pub fn no_internet(engine_id: impl Into<String>) -> Self {
        Self {
            engine_id: engine_id.into(),
            reason: "no_internet".to_string(),
            misconfig: false,
        }
    }
}

/// The exact field set every non-exceptional `route()` return carries
/// (spec.md §4.6, §8.1 invariant 8 — "Envelope contract").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEnvelope {
    /// Generated text, empty on a degraded envelope.
    pub response: String,
    /// Provider family of the engine that produced `response`, or
    /// `"degraded_fallback"` when no attempt succeeded.
    pub llm_used: String,
    /// Engine id that produced `response`, if any.
    pub engine_id: Option<EngineId>,
    /// Backend model identifier actually used, if any.
    pub model_selected: Option<String>,
    /// Latency of the successful attempt (or of the last attempt, when
    /// degraded), in milliseconds.
    pub latency_ms: u64,
    /// Prompt tokens of the successful attempt.
    pub input_tokens: u32,
    /// Completion tokens of the successful attempt.
    pub output_tokens: u32,
    /// Estimated cost of the successful attempt, in USD.
    pub cost_usd: f64,
    /// `true` iff the successful engine was not `chain[0]`.
    pub fallback_used: bool,
    /// Count of adapter calls actually made (skips do not count).
    pub attempts: u32,
    /// The plan this route executed, echoed back for audit.
    pub inference_plan: Option<InferencePlan>,
    /// Engines considered but not attempted.
    pub skipped_engines: Vec<SkippedEngine>,
    /// Internet Health status observed at routing time.
    pub internet_status: InternetStatus,
    /// `true` for a synthetic degraded-fallback or loop-guard-blocked
    /// response.
    pub degraded: bool,
    /// `true` iff a caller cancellation signal stopped the chain early.
    #[serde(default)]
    pub cancelled: bool,
}

impl RouteEnvelope {
    /// The deterministic placeholder text used for a degraded fallback
    /// (spec.md §4.6, §7 Degradation).
    pub const DEGRADED_PLACEHOLDER: &'static str =
        "I'm unable to reach any inference backend right now. Please try again shortly.";

    /// Build the synthetic envelope for loop-guard rejection (spec.md §4.8,
    /// §8.1 invariant 9). Performs zero adapter calls and never consults
    /// the registry or scheduler.
    #[must_use]
    pub fn blocked_hop(internet_status: InternetStatus) -> Self {
        Self {
            response: String::new(),
            llm_used: "blocked_hop".to_string(),
            engine_id: None,
            model_selected: None,
            latency_ms: 0,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            fallback_used: false,
            attempts: 0,
            inference_plan: None,
            skipped_engines: Vec::new(),
            internet_status,
            degraded: true,
            cancelled: false,
        }
    }

    /// Build the partial envelope returned when a caller cancellation
    /// signal fires mid-attempt (spec.md §5, §7, §8.3). The chain stops
    /// immediately: no further fallback is attempted once this fires.
    #[must_use]
    pub fn cancelled(
        attempts: u32,
        inference_plan: Option<InferencePlan>,
        skipped_engines: Vec<SkippedEngine>,
        internet_status: InternetStatus,
    ) -> Self {
        Self {
            response: String::new(),
            llm_used: "cancelled".to_string(),
            engine_id: None,
            model_selected: None,
            latency_ms: 0,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            fallback_used: attempts > 1,
            attempts,
            inference_plan,
            skipped_engines,
            internet_status,
            degraded: true,
            cancelled: true,
        }
    }
}
