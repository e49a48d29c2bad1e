//! The Gateway Router: an optional pre-scheduler task-profile resolver
//! (spec.md §4.5).
//!
//! Maps `(intent, phase)` to a seeded [`RoutingRule`](crate::seed::RoutingRule),
//! then resolves it into candidate engine ids, a strategy, and budget
//! overrides. The scheduler's local-first plan assembly (spec.md §4.4) is
//! unaffected when this layer is skipped.

use crate::seed::{self, BudgetOverride, RoutingRule, Strategy};
use denis_core::{EngineId, EngineRegistry, InternetStatus};

/// The fully resolved routing decision for one `(intent, phase)` pair
/// (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// The task profile the intent/phase pair resolved to.
    pub task_profile_id: &'static str,
    /// Ordered candidate engine ids, already filtered by registry presence
    /// and by `require_internet` (spec.md §4.5: emptied, not filtered).
    pub candidates: Vec<EngineId>,
    /// Execution strategy named by the resolved rule.
    pub strategy: Strategy,
    /// Budget overrides named by the resolved rule, if any.
    pub budget: BudgetOverride,
}

impl ResolvedRoute {
    /// First candidate, if any — the primary engine a plan built from this
    /// route would target.
    #[must_use]
    pub fn primary(&self) -> Option<&EngineId> {
        self.candidates.first()
    }

    /// Remaining candidates after the primary.
    #[must_use]
    pub fn fallbacks(&self) -> &[EngineId] {
        self.candidates.get(1..).unwrap_or(&[])
    }
}

/// Seed-table-backed task-profile resolver (spec.md §4.5). Stateless: all
/// seed data lives in [`crate::seed`], so this type exists only to group
/// the resolution steps under one name, matching the original's
/// `GatewayRouter` class shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayRouter;

impl GatewayRouter {
    /// Build a resolver. Carries no state; seed tables are process-wide
    /// constants.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Map `(intent, phase)` to a `task_profile_id` (spec.md §4.5).
    #[must_use]
    pub fn resolve_task_profile(&self, intent: &str, phase: &str) -> &'static str {
        seed::resolve_task_profile(intent, phase)
    }

    /// Ordered candidate engine ids for `task_profile_id`, filtered by
    /// registry presence. When the resolved rule requires internet and
    /// `health != OK`, the candidate list is emptied outright rather than
    /// filtered down (spec.md §4.5).
    #[must_use]
    pub fn select_candidates(
        &self,
        task_profile_id: &str,
        health: InternetStatus,
        registry: &EngineRegistry,
    ) -> Vec<EngineId> {
        let rule = seed::routing_rule(task_profile_id);
        if rule.require_internet && health != InternetStatus::Ok {
            return Vec::new();
        }
        rule.candidate_engine_ids
            .iter()
            .map(|id| EngineId::new(*id))
            .filter(|id| registry.get(id).is_some())
            .collect()
    }

    /// Budget overrides named by `task_profile_id`'s rule, defaulted when
    /// the rule carries none.
    #[must_use]
    pub fn apply_budgets(&self, task_profile_id: &str) -> BudgetOverride {
        seed::routing_rule(task_profile_id).budget_override.unwrap_or_default()
    }

    /// Execution strategy named by `task_profile_id`'s rule.
    #[must_use]
    pub fn choose_strategy(&self, task_profile_id: &str) -> Strategy {
        seed::routing_rule(task_profile_id).strategy
    }

    /// Resolve `(intent, phase)` end to end: task profile, candidates,
    /// strategy, and budget, enforcing fast-intent safety along the way.
    #[must_use]
    pub fn resolve(
        &self,
        intent: &str,
        phase: &str,
        health: InternetStatus,
        registry: &EngineRegistry,
    ) -> ResolvedRoute {
        let task_profile_id = self.resolve_task_profile(intent, phase);
        let candidates = self.select_candidates(task_profile_id, health, registry);

        let candidate_refs: Vec<&str> = candidates.iter().map(EngineId::as_str).collect();
        if !seed::validate_fast_intent_safety(task_profile_id, &candidate_refs) {
            tracing::warn!(
                task_profile_id,
                "fast-intent safety violation at candidate selection; emptying candidates"
            );
            return ResolvedRoute {
                task_profile_id,
                candidates: Vec::new(),
                strategy: self.choose_strategy(task_profile_id),
                budget: self.apply_budgets(task_profile_id),
            };
        }

        ResolvedRoute {
            task_profile_id,
            candidates,
            strategy: self.choose_strategy(task_profile_id),
            budget: self.apply_budgets(task_profile_id),
        }
    }
}
