//! End-to-end scenarios from spec.md §8.4: Scheduler assembles a plan,
//! Router executes it against real adapters talking to mock HTTP servers.
//!
//! Scenario 5 ("misconfigured plan") is covered at the unit level in
//! `denis-routing::router::tests::unknown_plan_engine_is_skipped_as_misconfig`,
//! where a stub adapter is enough; it is not repeated here.

use crate::fixtures::{booster_engine, greeting_request, local_engine, registry_of};
use crate::mock_servers::{mock_chat_error, mock_chat_success};
use denis_config::DenisConfig;
use denis_core::{Engine, EngineRegistry, InferencePlan, ProviderFamily};
use denis_health::InternetHealth;
use denis_providers::{build_adapters, ProviderApiKeys};
use denis_routing::{AssignOutcome, Router, Scheduler};
use denis_telemetry::{MetricsStore, TraceSink};
use std::sync::Arc;
use std::time::Duration;

fn health_always(ok: bool) -> InternetHealth {
    InternetHealth::with_probe(Duration::from_secs(60), Box::new(move || ok))
}

fn router_over(registry: EngineRegistry, health: InternetHealth) -> Router {
    let adapters = build_adapters(reqwest::Client::new(), &ProviderApiKeys::default());
    Router::new(
        registry,
        health,
        adapters,
        Arc::new(MetricsStore::new()),
        TraceSink::new(16),
        DenisConfig::default(),
    )
}

#[tokio::test]
async fn happy_local_path() {
    let l1 = mock_chat_success("hi there", 3, 4).await;
    let registry = registry_of(vec![
        local_engine("l1", &l1.uri(), 10),
        booster_engine("b1", "http://unused", 5),
    ]);

    let scheduler = Scheduler::new(registry.clone(), health_always(true));
    let request = greeting_request();
    let plan = scheduler.assign(&request).expect("plan assembled");
    assert_eq!(plan.primary_engine_id.as_str(), "l1");
    assert_eq!(plan.fallback_engine_ids.len(), 1);
    assert_eq!(plan.fallback_engine_ids[0].as_str(), "b1");

    let router = router_over(registry, health_always(true));
    let envelope = router.route(&request, Some(&plan)).await;
    assert_eq!(envelope.llm_used, "llamacpp");
    assert_eq!(envelope.engine_id.map(|id| id.to_string()), Some("l1".to_string()));
    assert_eq!(envelope.attempts, 1);
    assert!(!envelope.fallback_used);
    assert!(!envelope.degraded);
}

#[tokio::test]
async fn offline_booster_suppression() {
    let l1 = mock_chat_error(500).await;
    let registry = registry_of(vec![
        local_engine("l1", &l1.uri(), 10),
        booster_engine("b1", "http://unused", 5),
    ]);

    let scheduler = Scheduler::new(registry.clone(), health_always(false));
    let request = greeting_request();
    let plan = scheduler.assign(&request).expect("plan assembled");
    assert_eq!(plan.primary_engine_id.as_str(), "l1");
    assert!(
        plan.fallback_engine_ids.is_empty(),
        "the booster requires internet and health is down, so it must not appear in the chain"
    );

    let router = router_over(registry, health_always(false));
    let envelope = router.route(&request, Some(&plan)).await;
    assert_eq!(envelope.llm_used, "degraded_fallback");
    assert!(envelope.degraded);
    assert_eq!(envelope.attempts, 1);
    assert!(envelope.skipped_engines.is_empty());
}

#[tokio::test]
async fn fallback_success_after_primary_failure() {
    let l1 = mock_chat_error(500).await;
    let l2 = mock_chat_success("hello from l2", 5, 6).await;
    let registry = registry_of(vec![
        local_engine("l1", &l1.uri(), 10),
        local_engine("l2", &l2.uri(), 20),
        booster_engine("b1", "http://unused", 5),
    ]);

    let scheduler = Scheduler::new(registry.clone(), health_always(true));
    let request = greeting_request();
    let plan = scheduler.assign(&request).expect("plan assembled");
    assert_eq!(plan.primary_engine_id.as_str(), "l1");

    let router = router_over(registry, health_always(true));
    let envelope = router.route(&request, Some(&plan)).await;
    assert_eq!(envelope.llm_used, "llamacpp");
    assert_eq!(envelope.engine_id.map(|id| id.to_string()), Some("l2".to_string()));
    assert_eq!(envelope.attempts, 2);
    assert!(envelope.fallback_used);
    assert!(!envelope.degraded);
}

#[tokio::test]
async fn cost_ceiling_breach_degrades_instead_of_succeeding() {
    let l1 = mock_chat_success("expensive answer", 400, 400).await;
    let engine = Engine::builder("l1", ProviderFamily::LlamaCpp)
        .endpoint(l1.uri())
        .model("l1-model")
        .tag(denis_core::engine::TAG_LOCAL)
        .cost_factor(0.001)
        .build()
        .expect("valid engine");
    let registry = registry_of(vec![engine]);

    let mut request = greeting_request();
    request.payload.max_tokens = Some(512);
    request.max_cost_usd = Some(0.0001);

    let plan = InferencePlan::builder("l1").build().expect("valid plan");
    let router = router_over(registry, health_always(true));
    let envelope = router.route(&request, Some(&plan)).await;

    assert!(envelope.degraded, "0.0008 computed cost exceeds the 0.0001 ceiling");
    assert_eq!(envelope.response, denis_core::RouteEnvelope::DEGRADED_PLACEHOLDER);
}

#[tokio::test]
async fn loop_guard_blocks_before_any_adapter_call() {
    let l1 = mock_chat_success("should never be seen", 1, 1).await;
    let registry = registry_of(vec![local_engine("l1", &l1.uri(), 10)]);
    let plan = InferencePlan::builder("l1").build().expect("valid plan");

    let mut config = DenisConfig::default();
    config.openai_compat_max_hop = 0;
    let adapters = build_adapters(reqwest::Client::new(), &ProviderApiKeys::default());
    let router = Router::new(
        registry,
        health_always(true),
        adapters,
        Arc::new(MetricsStore::new()),
        TraceSink::new(16),
        config,
    );

    let request = greeting_request();
    let envelope = denis_core::hop::scope(1, router.route(&request, Some(&plan))).await;

    assert_eq!(envelope.llm_used, "blocked_hop");
    assert!(envelope.degraded);
    assert_eq!(l1.received_requests().await.expect("mock tracks requests").len(), 0);
}

#[tokio::test]
async fn zero_engines_yields_no_plan_and_a_degraded_route() {
    let registry = registry_of(vec![]);
    let scheduler = Scheduler::new(registry.clone(), health_always(true));
    let request = greeting_request();

    assert_eq!(scheduler.assign(&request), Err(AssignOutcome::NoEligibleEngine));

    let router = router_over(registry, health_always(true));
    let envelope = router.route(&request, None).await;
    assert_eq!(envelope.llm_used, "degraded_fallback");
    assert!(envelope.degraded);
}
