//! The immutable inference plan (spec.md §3.4).

use crate::error::{DenisError, DenisResult};
use crate::registry::EngineRegistry;
use crate::types::EngineId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A retryable condition named in `attempt_policy.retry_on` (spec.md §3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// The adapter call exceeded its timeout.
    Timeout,
    /// The backend returned a 5xx status.
    #[serde(rename = "5xx")]
    ServerError5xx,
}

/// `{max_attempts, retry_on}` (spec.md §3.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptPolicy {
    /// Upper bound on attempts across the whole chain. `≥ 1`.
    pub max_attempts: u32,
    /// Conditions under which the router advances to the next engine.
    pub retry_on: HashSet<RetryOn>,
}

impl AttemptPolicy {
    /// The default policy the scheduler applies: `1 + len(fallbacks)`
    /// attempts, retrying on timeout and 5xx (spec.md §4.4).
    #[must_use]
    pub fn default_for_fallback_count(fallback_count: usize) -> Self {
        Self {
            max_attempts: 1 + fallback_count as u32,
            retry_on: HashSet::from([RetryOn::Timeout, RetryOn::ServerError5xx]),
        }
    }
}

/// `{connect_ms, total_ms}` (spec.md §3.4, §4.4 defaults: `total_ms=5000`,
/// `connect_ms=200`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timeouts {
    /// Connect-phase budget, when the transport supports enforcing it.
    pub connect_ms: u64,
    /// Whole-call budget; always enforced by the router (spec.md §5).
    pub total_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_ms: 200,
            total_ms: 5000,
        }
    }
}

/// `{planned_tokens, planned_cost_usd}` (spec.md §3.4, §4.4).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Budget {
    /// Token ceiling this plan was shaped for.
    pub planned_tokens: u32,
    /// Estimated cost at `planned_tokens`, in USD.
    pub planned_cost_usd: f64,
}

/// `{primary_engine_id, fallback_engine_ids, expected_model?, params,
/// timeouts_ms, budget, trace_tags, attempt_policy}` (spec.md §3.4).
///
/// Immutable once built; the router consumes it by reference and never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferencePlan {
    /// First engine the router attempts.
    pub primary_engine_id: EngineId,
    /// Remaining engines, in attempt order.
    pub fallback_engine_ids: Vec<EngineId>,
    /// Registered model of `primary_engine_id`, when asserted.
    pub expected_model: Option<String>,
    /// Merged under request-supplied params at attempt time (request wins).
    pub params: HashMap<String, serde_json::Value>,
    /// Per-attempt timeout budget.
    pub timeouts_ms: Timeouts,
    /// Planned token/cost envelope.
    pub budget: Budget,
    /// Opaque bag stamped into every trace this plan produces.
    pub trace_tags: HashMap<String, serde_json::Value>,
    /// Attempt/retry policy.
    pub attempt_policy: AttemptPolicy,
}

impl InferencePlan {
    /// Start building a plan for the given primary engine.
    #[must_use]
    pub fn builder(primary_engine_id: impl Into<EngineId>) -> InferencePlanBuilder {
        InferencePlanBuilder::new(primary_engine_id)
    }

    /// `[primary] ++ fallbacks`, in attempt order (spec.md Glossary: Chain).
    #[must_use]
    pub fn chain(&self) -> Vec<EngineId> {
        let mut chain = vec![self.primary_engine_id.clone()];
        chain.extend(self.fallback_engine_ids.iter().cloned());
        chain
    }

    /// Guard-rail check (spec.md §4.4): every engine id this plan names
    /// must resolve in `registry`, and `expected_model`, if set, must equal
    /// the primary's registered model.
    ///
    /// # Errors
    /// Returns [`DenisError::RegistryMisconfiguration`] on the first
    /// violation found.
    pub fn validate_against(&self, registry: &EngineRegistry) -> DenisResult<()> {
        let primary = registry.get(&self.primary_engine_id).ok_or_else(|| {
            DenisError::RegistryMisconfiguration {
                message: format!(
                    "plan primary engine '{}' not found in registry",
                    self.primary_engine_id
                ),
            }
        })?;

        for fallback in &self.fallback_engine_ids {
            if registry.get(fallback).is_none() {
                return Err(DenisError::RegistryMisconfiguration {
                    message: format!("plan fallback engine '{fallback}' not found in registry"),
                });
            }
        }

        if let Some(expected) = &self.expected_model {
            if expected != &primary.model {
                return Err(DenisError::RegistryMisconfiguration {
                    message: format!(
                        "plan expected_model '{expected}' does not match primary engine's registered model '{}'",
                        primary.model
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Builder for [`InferencePlan`].
#[derive(Debug)]
pub struct InferencePlanBuilder {
    primary_engine_id: EngineId,
    fallback_engine_ids: Vec<EngineId>,
    expected_model: Option<String>,
    params: HashMap<String, serde_json::Value>,
    timeouts_ms: Timeouts,
    budget: Budget,
    trace_tags: HashMap<String, serde_json::Value>,
    attempt_policy: Option<AttemptPolicy>,
}

impl InferencePlanBuilder {
    /// Start a new builder for the given primary engine.
    #[must_use]
    pub fn new(primary_engine_id: impl Into<EngineId>) -> Self {
        Self {
            primary_engine_id: primary_engine_id.into(),
            fallback_engine_ids: Vec::new(),
            expected_model: None,
            params: HashMap::new(),
            timeouts_ms: Timeouts::default(),
            budget: Budget::default(),
            trace_tags: HashMap::new(),
            attempt_policy: None,
        }
    }

    /// Append a fallback engine.
    #[must_use]
    pub fn fallback(mut self, engine_id: impl Into<EngineId>) -> Self {
        self.fallback_engine_ids.push(engine_id.into());
        self
    }

    /// Set all fallbacks at once.
    #[must_use]
    pub fn fallbacks(mut self, engine_ids: Vec<EngineId>) -> Self {
        self.fallback_engine_ids = engine_ids;
        self
    }

    /// Assert the expected primary model.
    #[must_use]
    pub fn expected_model(mut self, model: impl Into<String>) -> Self {
        self.expected_model = Some(model.into());
        self
    }

    /// Merge in a plan-level param.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Set the timeout budget.
    #[must_use]
    pub fn timeouts_ms(mut self, timeouts: Timeouts) -> Self {
        self.timeouts_ms = timeouts;
        self
    }

    /// Set the planned budget.
    #[must_use]
    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Stamp a trace tag.
    #[must_use]
    pub fn trace_tag(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.trace_tags.insert(key.into(), value);
        self
    }

    /// Override the default attempt policy.
    #[must_use]
    pub fn attempt_policy(mut self, policy: AttemptPolicy) -> Self {
        self.attempt_policy = Some(policy);
        self
    }

    /// Build the plan.
    ///
    /// # Errors
    /// Returns [`DenisError::InvalidRequest`] if the resulting
    /// `attempt_policy.max_attempts` is zero.
    pub fn build(self) -> DenisResult<InferencePlan> {
        let attempt_policy = self
            .attempt_policy
            .unwrap_or_else(|| AttemptPolicy::default_for_fallback_count(self.fallback_engine_ids.len()));

        if attempt_policy.max_attempts < 1 {
            return Err(DenisError::invalid_field(
                "attempt_policy.max_attempts",
                "max_attempts must be >= 1",
            ));
        }

        Ok(InferencePlan {
            primary_engine_id: self.primary_engine_id,
            fallback_engine_ids: self.fallback_engine_ids,
            expected_model: self.expected_model,
            params: self.params,
            timeouts_ms: self.timeouts_ms,
            budget: self.budget,
            trace_tags: self.trace_tags,
            attempt_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, ProviderFamily, TAG_LOCAL};

    fn registry_with_one_local() -> EngineRegistry {
        let engine = Engine::builder("L1", ProviderFamily::LlamaCpp)
            .endpoint("http://node/l1")
            .model("llama-3-8b")
            .tag(TAG_LOCAL)
            .build()
            .unwrap();
        EngineRegistry::load(vec![engine]).unwrap()
    }

    #[test]
    fn chain_is_primary_then_fallbacks() {
        let plan = InferencePlan::builder("L1")
            .fallback("L2")
            .fallback("B1")
            .build()
            .unwrap();
        let chain: Vec<&str> = plan.chain().iter().map(EngineId::as_str).collect();
        assert_eq!(chain, vec!["L1", "L2", "B1"]);
    }

    #[test]
    fn default_attempt_policy_matches_chain_length() {
        let plan = InferencePlan::builder("L1").fallback("L2").build().unwrap();
        assert_eq!(plan.attempt_policy.max_attempts, 2);
    }

    #[test]
    fn validate_against_rejects_unknown_primary() {
        let registry = registry_with_one_local();
        let plan = InferencePlan::builder("missing").build().unwrap();
        assert!(plan.validate_against(&registry).is_err());
    }

    #[test]
    fn validate_against_rejects_model_mismatch() {
        let registry = registry_with_one_local();
        let plan = InferencePlan::builder("L1")
            .expected_model("wrong-model")
            .build()
            .unwrap();
        assert!(plan.validate_against(&registry).is_err());
    }

    #[test]
    fn validate_against_accepts_consistent_plan() {
        let registry = registry_with_one_local();
        let plan = InferencePlan::builder("L1")
            .expected_model("llama-3-8b")
            .build()
            .unwrap();
        assert!(plan.validate_against(&registry).is_ok());
    }
}
