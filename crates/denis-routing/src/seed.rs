//! Gateway Router seed tables (spec.md §4.5, SPEC_FULL.md §4.9).
//!
//! Phase 1 hardcoded seed maps, ported from the original's
//! `inference/gateway_router.py`. A later phase may resolve task profiles
//! from a graph backend instead; nothing downstream should assume these
//! tables are the only source.

/// Execution strategy named by a [`RoutingRule`] (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Stop after the first attempt regardless of outcome.
    Single,
    /// The normal primary-then-fallbacks chain.
    Fallback,
    /// Reserved for a future dual-call path; not exercised in v1.
    ParallelVerify,
}

/// Budget knobs a [`RoutingRule`] may override on top of plan defaults
/// (spec.md §4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetOverride {
    /// Overrides `InferencePlan::budget.planned_tokens` when set.
    pub max_output_tokens: Option<u32>,
    /// Overrides `InferencePlan::timeouts_ms.total_ms` when set.
    pub timeout_ms: Option<u64>,
    /// Overrides `InferenceRequest::max_cost_usd` enforcement when set.
    pub max_cost_usd: Option<f64>,
}

/// One seeded `(intent, phase)` → engine-candidate mapping (spec.md §4.5).
#[derive(Debug, Clone, Copy)]
pub struct RoutingRule {
    /// Stable rule identifier, for audit.
    pub rule_id: &'static str,
    /// The task profile this rule is keyed by.
    pub task_profile_id: &'static str,
    /// Ordered candidate engine ids.
    pub candidate_engine_ids: &'static [&'static str],
    /// Execution strategy.
    pub strategy: Strategy,
    /// When `true`, candidates are emptied (not filtered) while health ≠ `OK`.
    pub require_internet: bool,
    /// Budget overrides, if any.
    pub budget_override: Option<BudgetOverride>,
}

/// Expensive providers a "fast" profile must never list (spec.md §4.5).
pub const EXPENSIVE_PROVIDERS: &[&str] =
    &["groq_booster", "openrouter_booster", "claude_booster", "perplexity_sonar_pro"];

/// Profiles subject to the fast-intent safety check (spec.md §4.5).
pub const FAST_PROFILES: &[&str] =
    &["intent_detection_fast", "pro_search_prepare_fast", "tool_runner_read_only"];

/// The default task profile an unmatched `(intent, phase)` falls back to.
pub const DEFAULT_TASK_PROFILE: &str = "chat_general";

const SEED_ROUTING_RULES: &[RoutingRule] = &[
    RoutingRule {
        rule_id: "rr_01",
        task_profile_id: "intent_detection_fast",
        candidate_engine_ids: &["qwen3b_local", "qwen_coder7b_local"],
        strategy: Strategy::Single,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(128),
            timeout_ms: Some(800),
            max_cost_usd: None,
        }),
    },
    RoutingRule {
        rule_id: "rr_02",
        task_profile_id: "chat_general",
        candidate_engine_ids: &["qwen_coder7b_local", "qwen3b_local", "groq_booster"],
        strategy: Strategy::Fallback,
        require_internet: false,
        budget_override: None,
    },
    RoutingRule {
        rule_id: "rr_03",
        task_profile_id: "codecraft_generate",
        candidate_engine_ids: &["qwen_coder7b_local", "groq_booster", "openrouter_booster"],
        strategy: Strategy::Fallback,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(2048),
            timeout_ms: Some(15_000),
            max_cost_usd: None,
        }),
    },
    RoutingRule {
        rule_id: "rr_04",
        task_profile_id: "premium_search",
        candidate_engine_ids: &["perplexity_sonar_pro"],
        strategy: Strategy::Single,
        require_internet: true,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(1024),
            timeout_ms: Some(10_000),
            max_cost_usd: None,
        }),
    },
    RoutingRule {
        rule_id: "rr_05",
        task_profile_id: "pro_search_prepare_fast",
        candidate_engine_ids: &["qwen3b_local"],
        strategy: Strategy::Single,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(600),
            timeout_ms: Some(800),
            max_cost_usd: None,
        }),
    },
    RoutingRule {
        rule_id: "rr_06",
        task_profile_id: "deep_audit",
        candidate_engine_ids: &["qwen_coder7b_local", "groq_booster", "claude_booster"],
        strategy: Strategy::Fallback,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(4096),
            timeout_ms: Some(30_000),
            max_cost_usd: Some(0.05),
        }),
    },
    RoutingRule {
        rule_id: "rr_07",
        task_profile_id: "tool_runner_read_only",
        candidate_engine_ids: &["qwen3b_local"],
        strategy: Strategy::Single,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(256),
            timeout_ms: Some(2000),
            max_cost_usd: None,
        }),
    },
    RoutingRule {
        rule_id: "rr_08",
        task_profile_id: "summarize_artifact",
        candidate_engine_ids: &["qwen_coder7b_local", "qwen3b_local"],
        strategy: Strategy::Fallback,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(1024),
            timeout_ms: Some(8000),
            max_cost_usd: None,
        }),
    },
    RoutingRule {
        rule_id: "rr_09",
        task_profile_id: "chat_code",
        candidate_engine_ids: &["qwen_coder7b_local", "groq_booster"],
        strategy: Strategy::Fallback,
        require_internet: false,
        budget_override: Some(BudgetOverride {
            max_output_tokens: Some(1024),
            timeout_ms: Some(10_000),
            max_cost_usd: None,
        }),
    },
];

/// `(intent, phase)` → `task_profile_id`. `"*"` is the wildcard phase.
const SEED_TASK_PROFILES: &[(&str, &str, &str)] = &[
    ("chat_general", "*", "chat_general"),
    ("greeting", "*", "intent_detection_fast"),
    ("repo_summary", "shallow", "pro_search_prepare_fast"),
    ("repo_summary", "deep", "deep_audit"),
    ("search", "premium", "premium_search"),
    ("code_generate", "*", "codecraft_generate"),
    ("tool_run", "*", "tool_runner_read_only"),
    ("summarize", "*", "summarize_artifact"),
    ("code_review", "*", "chat_code"),
    ("code_explain", "*", "chat_code"),
];

/// Map `(intent, phase)` to a `task_profile_id` (spec.md §4.5): an exact
/// match wins over the `(intent, *)` wildcard; an unmatched intent falls
/// back to [`DEFAULT_TASK_PROFILE`].
#[must_use]
pub fn resolve_task_profile(intent: &str, phase: &str) -> &'static str {
    if let Some((_, _, profile)) = SEED_TASK_PROFILES
        .iter()
        .find(|(i, p, _)| *i == intent && *p == phase)
    {
        return profile;
    }
    if let Some((_, _, profile)) = SEED_TASK_PROFILES.iter().find(|(i, p, _)| *i == intent && *p == "*") {
        return profile;
    }
    DEFAULT_TASK_PROFILE
}

/// Look up the seeded rule for a `task_profile_id`, falling back to
/// [`DEFAULT_TASK_PROFILE`]'s rule when the id is unrecognized.
#[must_use]
pub fn routing_rule(task_profile_id: &str) -> &'static RoutingRule {
    SEED_ROUTING_RULES
        .iter()
        .find(|rule| rule.task_profile_id == task_profile_id)
        .unwrap_or_else(|| {
            SEED_ROUTING_RULES
                .iter()
                .find(|rule| rule.task_profile_id == DEFAULT_TASK_PROFILE)
                .expect("chat_general seed rule always present")
        })
}

/// Fast-intent safety regression guard (spec.md §4.5): a profile in
/// [`FAST_PROFILES`] must never list an engine id in
/// [`EXPENSIVE_PROVIDERS`]. Enforced both here (seed-load validation) and
/// again by the Gateway Router at candidate-selection time.
#[must_use]
pub fn validate_fast_intent_safety(task_profile_id: &str, candidate_engine_ids: &[&str]) -> bool {
    if FAST_PROFILES.contains(&task_profile_id) {
        return !candidate_engine_ids
            .iter()
            .any(|candidate| EXPENSIVE_PROVIDERS.contains(candidate));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_wildcard() {
        assert_eq!(resolve_task_profile("repo_summary", "deep"), "deep_audit");
        assert_eq!(resolve_task_profile("repo_summary", "shallow"), "pro_search_prepare_fast");
    }

    #[test]
    fn wildcard_matches_any_phase() {
        assert_eq!(resolve_task_profile("greeting", "whatever"), "intent_detection_fast");
    }

    #[test]
    fn unknown_intent_falls_back_to_default() {
        assert_eq!(resolve_task_profile("never_seen", "*"), DEFAULT_TASK_PROFILE);
    }

    #[test]
    fn every_seed_rule_passes_its_own_fast_intent_check() {
        for rule in SEED_ROUTING_RULES {
            assert!(
                validate_fast_intent_safety(rule.task_profile_id, rule.candidate_engine_ids),
                "rule {} violates fast-intent safety",
                rule.rule_id
            );
        }
    }

    #[test]
    fn fast_profile_rejects_expensive_candidate() {
        assert!(!validate_fast_intent_safety(
            "intent_detection_fast",
            &["groq_booster"]
        ));
    }

    #[test]
    fn non_fast_profile_permits_expensive_candidate() {
        assert!(validate_fast_intent_safety("chat_general", &["groq_booster"]));
    }
}
