//! The `DecisionTrace` wire schema (spec.md §4.7, §6.6).
//!
//! A trace is emitted fire-and-forget by the router, scheduler, and
//! Gateway Router for every decision point. Each `kind` only legally
//! pairs with a subset of `mode` values (spec.md §4.7's table); that
//! pairing is enforced by [`DecisionTrace::new`], following the same
//! validated-construction idiom as `denis_core`'s builders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The class of decision a trace records (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// An engine was chosen (or none could be).
    EngineSelection,
    /// A tool invocation was gated.
    ToolApproval,
    /// A plan was chosen by the scheduler or Gateway Router.
    PlanSelection,
    /// Network path classification of the selected engine.
    Routing,
    /// A research/search-augmented call path.
    Research,
    /// A policy was evaluated.
    PolicyEval,
}

/// The outcome recorded alongside a [`TraceKind`] (spec.md §4.7). Legal
/// `(kind, mode)` pairs are enforced at construction time; the full set
/// of variants is open here because the enum is shared across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceMode {
    /// `engine_selection`: first attempt succeeded.
    Primary,
    /// `engine_selection`: handed off to a different execution surface.
    Offload,
    /// `engine_selection` / `plan_selection`: synthetic degraded outcome.
    Degraded,
    /// `engine_selection` / `plan_selection`: a later chain member was used.
    Fallback,
    /// `engine_selection`: shadow-router comparison.
    Shadow,
    /// `tool_approval`: approved without escalation.
    Approved,
    /// `tool_approval`: escalated to a human.
    RequiresHuman,
    /// `tool_approval` / `policy_eval`: rejected outright.
    Blocked,
    /// `plan_selection`: chosen without fallback.
    Selected,
    /// `plan_selection`: candidates emptied by a `require_internet` gate.
    Gated,
    /// `routing`: engine reachable on a dedicated link.
    Dedicated,
    /// `routing`: engine reachable over the local network.
    Lan,
    /// `routing`: engine reachable over a Tailscale overlay.
    Tailscale,
    /// `routing`: engine reachable only over the public internet.
    Cloud,
    /// `research`: low-latency path.
    Fast,
    /// `research`: exhaustive path.
    Deep,
    /// `research`: web-only source set.
    WebOnly,
    /// `research`: graph-only source set.
    GraphOnly,
    /// `policy_eval`: evaluation passed.
    Passed,
    /// `policy_eval`: policy forced a specific outcome.
    Forced,
    /// `policy_eval`: evaluation was skipped.
    Skipped,
}

impl TraceKind {
    /// The `mode` values legal for this `kind` (spec.md §4.7 table).
    #[must_use]
    pub fn legal_modes(self) -> &'static [TraceMode] {
        use TraceMode::{
            Approved, Blocked, Cloud, Dedicated, Deep, Degraded, Fallback, Fast, Forced, Gated,
            GraphOnly, Lan, Offload, Passed, Primary, RequiresHuman, Selected, Shadow, Skipped,
            Tailscale, WebOnly,
        };
        match self {
            Self::EngineSelection => &[Primary, Offload, Degraded, Fallback, Shadow],
            Self::ToolApproval => &[Approved, RequiresHuman, Blocked],
            Self::PlanSelection => &[Selected, Fallback, Gated],
            Self::Routing => &[Dedicated, Lan, Tailscale, Cloud],
            Self::Research => &[Fast, Deep, WebOnly, GraphOnly],
            Self::PolicyEval => &[Passed, Blocked, Forced, Skipped],
        }
    }
}

/// Confidence scores attached to a decision (spec.md §4.7 `confidence`
/// field), normalized to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    /// How well the request matched the routing rule that fired.
    pub rule_match: f64,
    /// Health/availability score of the selected engine.
    pub availability: f64,
    /// Combined score.
    pub overall: f64,
}

impl Confidence {
    /// Build from components; `overall` is their geometric mean.
    #[must_use]
    pub fn from_components(rule_match: f64, availability: f64) -> Self {
        Self {
            rule_match,
            availability,
            overall: (rule_match * availability).sqrt(),
        }
    }

    /// Maximal confidence, for deterministic or forced decisions.
    #[must_use]
    pub fn full() -> Self {
        Self {
            rule_match: 1.0,
            availability: 1.0,
            overall: 1.0,
        }
    }
}

/// Error returned by [`DecisionTrace::new`] when `mode` is not legal for `kind`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("mode {mode:?} is not legal for kind {kind:?}")]
pub struct IllegalModeError {
    /// The offending kind.
    pub kind: TraceKind,
    /// The offending mode.
    pub mode: TraceMode,
}

/// `{id, ts, kind, mode, reason, request_id, session_id, turn_id, intent,
/// engine, tool, plan_candidate, confidence, local_ok, policies[], extra}`
/// (spec.md §4.7, §6.6). Map-valued `extra` is carried as a JSON object,
/// serialized to a string only at the storage boundary (spec.md §6.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Fresh identifier generated per emission.
    pub id: String,
    /// Wall-clock emission time, RFC 3339.
    pub ts: chrono::DateTime<chrono::Utc>,
    /// Trace category.
    pub kind: TraceKind,
    /// Outcome within `kind`; always one of `kind.legal_modes()`.
    pub mode: TraceMode,
    /// Short snake_case reason code (spec.md §4.7: open set).
    pub reason: Option<String>,
    /// Correlates to the originating request.
    pub request_id: Option<String>,
    /// Correlates to the caller's session.
    pub session_id: Option<String>,
    /// Correlates to a conversational turn.
    pub turn_id: Option<String>,
    /// Classified intent name, when known.
    pub intent: Option<String>,
    /// Engine id this trace concerns, when known.
    pub engine: Option<String>,
    /// Tool name this trace concerns, when known.
    pub tool: Option<String>,
    /// Plan candidate identifier, when this trace concerns plan selection.
    pub plan_candidate: Option<String>,
    /// Confidence scores, when applicable.
    pub confidence: Option<Confidence>,
    /// Whether the decision could be satisfied without leaving the local network.
    pub local_ok: Option<bool>,
    /// Named policies evaluated en route to this decision.
    pub policies: Vec<String>,
    /// Free-form additional fields, never containing secrets.
    pub extra: HashMap<String, serde_json::Value>,
}

impl DecisionTrace {
    /// Build a trace, rejecting an illegal `(kind, mode)` pair.
    ///
    /// # Errors
    /// Returns [`IllegalModeError`] if `mode` is not legal for `kind`.
    pub fn new(id: impl Into<String>, kind: TraceKind, mode: TraceMode) -> Result<Self, IllegalModeError> {
        if !kind.legal_modes().contains(&mode) {
            return Err(IllegalModeError { kind, mode });
        }
        Ok(Self {
            id: id.into(),
            ts: chrono::Utc::now(),
            kind,
            mode,
            reason: None,
            request_id: None,
            session_id: None,
            turn_id: None,
            intent: None,
            engine: None,
            tool: None,
            plan_candidate: None,
            confidence: None,
            local_ok: None,
            policies: Vec::new(),
            extra: HashMap::new(),
        })
    }

    /// Attach a reason code.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach request/session/turn correlation ids.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach the engine id this trace concerns.
    #[must_use]
    pub fn with_engine(mut self, engine_id: impl Into<String>) -> Self {
        self.engine = Some(engine_id.into());
        self
    }

    /// Attach confidence scores.
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Merge an extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_illegal_mode_for_kind() {
        let result = DecisionTrace::new("t1", TraceKind::ToolApproval, TraceMode::Primary);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_legal_mode_for_kind() {
        let trace = DecisionTrace::new("t1", TraceKind::EngineSelection, TraceMode::Fallback)
            .expect("legal pair")
            .with_reason("groq_timeout")
            .with_engine("booster-1");
        assert_eq!(trace.reason.as_deref(), Some("groq_timeout"));
        assert_eq!(trace.engine.as_deref(), Some("booster-1"));
    }

    #[test]
    fn confidence_overall_is_geometric_mean() {
        let confidence = Confidence::from_components(0.9, 0.8);
        assert!((confidence.overall - 0.848_528).abs() < 0.001);
    }

    #[test]
    fn every_kind_has_at_least_one_legal_mode() {
        for kind in [
            TraceKind::EngineSelection,
            TraceKind::ToolApproval,
            TraceKind::PlanSelection,
            TraceKind::Routing,
            TraceKind::Research,
            TraceKind::PolicyEval,
        ] {
            assert!(!kind.legal_modes().is_empty());
        }
    }
}
