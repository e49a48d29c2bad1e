//! The Scheduler: local-first `InferencePlan` assembly (spec.md §4.4).
//!
//! Ported from the original's `kernel/scheduler.py::ModelScheduler.assign`.
//! Partitions the registry into `local`/`booster` buckets, prefers a local
//! primary, and falls back to boosters only when no local engine exists
//! and Internet Health is `OK`.

use denis_core::engine::{TAG_INTERNET_REQUIRED, TAG_LOCAL};
use denis_core::{
    Budget, Engine, EngineRegistry, InferencePlan, InferenceRequest, InternetStatus, RequestId,
};
use denis_health::InternetHealth;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Tokens reserved off `primary.max_context` when shaping `planned_tokens`
/// (spec.md §4.4).
const RESERVED_HEADROOM: u32 = 100;

/// Default `max_tokens` assumed when the caller's request doesn't set one
/// (ported from the original's `payload.get("max_tokens", 512)`).
const DEFAULT_MAX_TOKENS: u32 = 512;

fn parallel_limit(route_type: &str) -> u32 {
    match route_type {
        "fast_talk" | "safe" => 1,
        "tool" => 1,
        "project" | "deliberate" | "toolchain" => 4,
        "verify" => 1,
        _ => 1,
    }
}

/// Why the scheduler declined to produce a plan (spec.md §4.4 step 5 and
/// the parallelism-limit clause). Distinguished from a genuine absence of
/// a plan so the caller can log accordingly; both are handled identically
/// downstream — as a degraded fallback, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// No eligible local or booster engine exists (or internet is down and
    /// only boosters remain).
    NoEligibleEngine,
    /// The route's parallelism limit is already saturated.
    AtParallelLimit,
}

/// Local-first plan assembler (spec.md §4.4).
pub struct Scheduler {
    registry: EngineRegistry,
    health: InternetHealth,
    in_flight: Mutex<HashMap<RequestId, String>>,
}

impl Scheduler {
    /// Build a scheduler over `registry`, consulting `health` at plan time.
    #[must_use]
    pub fn new(registry: EngineRegistry, health: InternetHealth) -> Self {
        Self {
            registry,
            health,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn current_load(&self, route_type: &str) -> u32 {
        self.in_flight
            .lock()
            .values()
            .filter(|route| route.as_str() == route_type)
            .count() as u32
    }

    /// Whether another plan may be assigned to `route_type` right now.
    #[must_use]
    pub fn can_schedule(&self, route_type: &str) -> bool {
        self.current_load(route_type) < parallel_limit(route_type)
    }

    /// Assign an engine chain to `request` under the local-first policy.
    ///
    /// # Errors
    /// Returns [`AssignOutcome`] (not an error type; this path is not a
    /// runtime failure) when no plan can be produced.
    pub fn assign(&self, request: &InferenceRequest) -> Result<InferencePlan, AssignOutcome> {
        if !self.can_schedule(&request.route_type) {
            return Err(AssignOutcome::AtParallelLimit);
        }

        let internet_status = self.health.check();
        let internet_ok = internet_status == InternetStatus::Ok;

        let locals = self.registry.list(&denis_core::registry::EngineFilter::all().with_tag(TAG_LOCAL));
        let boosters = self
            .registry
            .list(&denis_core::registry::EngineFilter::all().with_tag(TAG_INTERNET_REQUIRED));

        let (primary, fallbacks, degraded) = if let Some((primary, rest)) = locals.split_first() {
            let mut fallbacks: Vec<Engine> = rest.to_vec();
            if internet_ok {
                fallbacks.extend(boosters);
            }
            (primary.clone(), fallbacks, false)
        } else if internet_ok {
            match boosters.split_first() {
                Some((primary, rest)) => (primary.clone(), rest.to_vec(), true),
                None => return Err(AssignOutcome::NoEligibleEngine),
            }
        } else {
            return Err(AssignOutcome::NoEligibleEngine);
        };

        let planned_tokens = request
            .payload
            .max_tokens
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .min(primary.max_context.saturating_sub(RESERVED_HEADROOM));
        let planned_cost_usd = if primary.cost_factor == 0.0 {
            0.0
        } else {
            (f64::from(planned_tokens) / 1000.0) * primary.cost_factor
        };

        let mut builder = InferencePlan::builder(primary.engine_id.clone())
            .expected_model(primary.model.clone())
            .fallbacks(fallbacks.iter().map(|e| e.engine_id.clone()).collect())
            .budget(Budget {
                planned_tokens,
                planned_cost_usd,
            })
            .trace_tag("policy_mode", serde_json::json!("local_first"))
            .trace_tag(
                "internet_status_at_plan",
                serde_json::json!(internet_status.to_string()),
            )
            .trace_tag("degraded", serde_json::json!(degraded));

        for (key, value) in &primary.default_params {
            builder = builder.param(key.clone(), value.clone());
        }
        if let Some(temperature) = request.payload.temperature {
            builder = builder.param("temperature", serde_json::json!(temperature));
        }
        builder = builder.param("max_tokens", serde_json::json!(planned_tokens));

        let plan = builder.build().map_err(|_| AssignOutcome::NoEligibleEngine)?;

        if plan.validate_against(&self.registry).is_err() {
            return Err(AssignOutcome::NoEligibleEngine);
        }

        self.in_flight
            .lock()
            .insert(request.request_id.clone(), request.route_type.clone());

        Ok(plan)
    }

    /// Release the in-flight slot held by `request_id`, e.g. after the
    /// router has finished executing its plan.
    pub fn release(&self, request_id: &RequestId) {
        self.in_flight.lock().remove(request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denis_core::engine::ProviderFamily;
    use denis_core::{InferenceRequest, Message};
    use std::time::Duration;

    fn local_engine(id: &str, priority: u32) -> Engine {
        Engine::builder(id, ProviderFamily::LlamaCpp)
            .endpoint(format!("http://node/{id}"))
            .model(format!("{id}-model"))
            .priority(priority)
            .max_context(4096)
            .tag(TAG_LOCAL)
            .build()
            .expect("valid engine")
    }

    fn booster_engine(id: &str, priority: u32) -> Engine {
        Engine::builder(id, ProviderFamily::Groq)
            .endpoint(format!("https://api/{id}"))
            .model(format!("{id}-model"))
            .priority(priority)
            .max_context(8192)
            .cost_factor(0.0008)
            .tag(TAG_INTERNET_REQUIRED)
            .build()
            .expect("valid engine")
    }

    fn sample_request() -> InferenceRequest {
        InferenceRequest::builder(RequestId::new("r1"))
            .route_type("chat")
            .task_type("chat_general")
            .message(Message::user("hello"))
            .build()
            .expect("valid request")
    }

    fn health_with(status: bool) -> InternetHealth {
        InternetHealth::with_probe(Duration::from_secs(30), Box::new(move || status))
    }

    #[test]
    fn prefers_lowest_priority_local_as_primary() {
        let registry =
            EngineRegistry::load(vec![local_engine("l2", 20), local_engine("l1", 10)]).unwrap();
        let scheduler = Scheduler::new(registry, health_with(true));
        let plan = scheduler.assign(&sample_request()).expect("plan");
        assert_eq!(plan.primary_engine_id.as_str(), "l1");
        assert_eq!(plan.fallback_engine_ids[0].as_str(), "l2");
    }

    #[test]
    fn boosters_appended_after_locals_only_when_internet_ok() {
        let registry = EngineRegistry::load(vec![local_engine("l1", 10), booster_engine("b1", 5)])
            .unwrap();
        let online = Scheduler::new(registry.clone(), health_with(true));
        let plan = online.assign(&sample_request()).expect("plan");
        assert_eq!(plan.fallback_engine_ids, vec!["b1".into()]);

        let offline = Scheduler::new(registry, health_with(false));
        let plan = offline.assign(&sample_request()).expect("plan");
        assert!(plan.fallback_engine_ids.is_empty());
    }

    #[test]
    fn degrades_to_booster_primary_when_no_locals_and_internet_ok() {
        let registry = EngineRegistry::load(vec![booster_engine("b1", 5)]).unwrap();
        let scheduler = Scheduler::new(registry, health_with(true));
        let plan = scheduler.assign(&sample_request()).expect("plan");
        assert_eq!(plan.primary_engine_id.as_str(), "b1");
        assert_eq!(
            plan.trace_tags.get("degraded"),
            Some(&serde_json::json!(true))
        );
    }

    #[test]
    fn no_locals_and_internet_down_yields_no_eligible_engine() {
        let registry = EngineRegistry::load(vec![booster_engine("b1", 5)]).unwrap();
        let scheduler = Scheduler::new(registry, health_with(false));
        assert_eq!(
            scheduler.assign(&sample_request()),
            Err(AssignOutcome::NoEligibleEngine)
        );
    }

    #[test]
    fn planned_tokens_respects_context_headroom() {
        let mut engine = local_engine("l1", 10);
        engine.max_context = 300;
        let registry = EngineRegistry::load(vec![engine]).unwrap();
        let scheduler = Scheduler::new(registry, health_with(true));
        let plan = scheduler.assign(&sample_request()).expect("plan");
        assert_eq!(plan.budget.planned_tokens, 200);
    }

    #[test]
    fn at_parallel_limit_refuses_further_assignment() {
        let registry = EngineRegistry::load(vec![local_engine("l1", 10)]).unwrap();
        let scheduler = Scheduler::new(registry, health_with(true));
        scheduler.assign(&sample_request()).expect("first plan succeeds");

        let second = InferenceRequest::builder(RequestId::new("r2"))
            .route_type("chat")
            .task_type("chat_general")
            .message(Message::user("hi again"))
            .build()
            .unwrap();
        assert_eq!(scheduler.assign(&second), Err(AssignOutcome::AtParallelLimit));

        scheduler.release(&RequestId::new("r1"));
        assert!(scheduler.assign(&second).is_ok());
    }
}
