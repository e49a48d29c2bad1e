//! The Router: executes an [`InferencePlan`] against the Registry and
//! provider adapters, or falls back to the legacy heuristic scorer when no
//! plan is supplied (spec.md §4.6).

use crate::gateway_router::GatewayRouter;
use crate::query_profile::{classify_query, QueryProfile};
use denis_config::DenisConfig;
use denis_contracts::{DecisionTrace, TraceKind, TraceMode};
use denis_core::engine::ProviderFamily;
use denis_core::registry::EngineFilter;
use denis_core::{
    CancellationRegistry, CancellationToken, Engine, EngineId, EngineRegistry, InferencePlan,
    InferenceRequest, InternetStatus, Message, ProviderAdapter, ProviderCallResult, RouteEnvelope,
    SkippedEngine,
};
use denis_health::InternetHealth;
use denis_resilience::{should_advance, BackoffPolicy};
use denis_telemetry::{MetricsStore, TraceSink};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Provider families attempted by the legacy heuristic path, in the order
/// scanned (ported from the original's `DENIS_INFERENCE_PROVIDER_ORDER`
/// default `llamacpp,vllm,groq,openrouter`). `Anthropic` is appended so the
/// "complex query" scoring bonus below has a family it can ever apply to —
/// the original names a `claude` bonus in `_score_provider` but never lists
/// it in its own provider order, so the bonus was unreachable dead code.
const LEGACY_PROVIDER_ORDER: [ProviderFamily; 5] = [
    ProviderFamily::LlamaCpp,
    ProviderFamily::Vllm,
    ProviderFamily::Groq,
    ProviderFamily::OpenRouter,
    ProviderFamily::Anthropic,
];

fn routing_mode_for(engine: &Engine) -> TraceMode {
    if engine.tags.contains("dedicated") {
        TraceMode::Dedicated
    } else if engine.tags.contains("tailscale") {
        TraceMode::Tailscale
    } else if engine.tags.contains("lan") {
        TraceMode::Lan
    } else if engine.requires_internet() {
        TraceMode::Cloud
    } else {
        TraceMode::Lan
    }
}

/// Executes plans (or, absent one, the legacy heuristic scorer) against
/// the Registry and a fixed set of provider adapters (spec.md §4.6).
pub struct Router {
    registry: EngineRegistry,
    health: InternetHealth,
    adapters: HashMap<ProviderFamily, Arc<dyn ProviderAdapter>>,
    metrics: Arc<MetricsStore>,
    traces: TraceSink,
    config: DenisConfig,
    gateway_router: GatewayRouter,
    backoff: BackoffPolicy,
    cancellation: CancellationRegistry,
}

impl Router {
    /// Build a router over a fixed adapter set (spec.md §4.3: the provider
    /// family set is small and closed).
    #[must_use]
    pub fn new(
        registry: EngineRegistry,
        health: InternetHealth,
        adapters: Vec<(ProviderFamily, Arc<dyn ProviderAdapter>)>,
        metrics: Arc<MetricsStore>,
        traces: TraceSink,
        config: DenisConfig,
    ) -> Self {
        Self {
            registry,
            health,
            adapters: adapters.into_iter().collect(),
            metrics,
            traces,
            config,
            gateway_router: GatewayRouter::new(),
            backoff: BackoffPolicy::with_defaults(),
            cancellation: CancellationRegistry::new(),
        }
    }

    /// Signal cancellation for a request currently in flight, keyed by the
    /// `cancel_key` it was submitted with (spec.md §3.3, §5, §7). Returns
    /// `true` if a matching in-flight request was found.
    pub fn cancel(&self, cancel_key: &str) -> bool {
        self.cancellation.cancel(cancel_key)
    }

    /// Route `request` using `plan` when supplied, or the legacy heuristic
    /// path otherwise (spec.md §4.6). Checked first against the loop guard
    /// (spec.md §4.8): an inbound hop count over the configured maximum
    /// short-circuits to a synthetic blocked envelope before any adapter
    /// call or registry lookup.
    pub async fn route(&self, request: &InferenceRequest, plan: Option<&InferencePlan>) -> RouteEnvelope {
        if denis_core::hop::current() > self.config.openai_compat_max_hop {
            return RouteEnvelope::blocked_hop(self.health.check());
        }

        match plan {
            Some(plan) => self.route_with_plan(request, plan).await,
            None => self.route_legacy(request).await,
        }
    }

    async fn call_adapter(
        &self,
        engine: &Engine,
        messages: &[Message],
        timeout: Duration,
        params: &HashMap<String, serde_json::Value>,
        cancel: CancellationToken,
    ) -> ProviderCallResult {
        match self.adapters.get(&engine.provider_family) {
            Some(adapter) => adapter.chat(engine, messages, timeout, params, cancel).await,
            None => ProviderCallResult::failure(
                engine.provider_family,
                engine.engine_id.clone(),
                engine.model.clone(),
                format!("{}_adapter_not_configured", engine.provider_family.as_str()),
                0,
            ),
        }
    }

    /// Reason code an adapter reports when a caller cancellation signal
    /// stopped its in-flight call (spec.md §5, §7).
    const CANCELLED_REASON: &'static str = "cancelled";

    fn unregister_cancellation(&self, request: &InferenceRequest) {
        if let Some(key) = request.cancel_key.as_deref() {
            self.cancellation.unregister(key);
        }
    }

    async fn route_with_plan(&self, request: &InferenceRequest, plan: &InferencePlan) -> RouteEnvelope {
        let chain = plan.chain();
        let max_attempts = plan.attempt_policy.max_attempts;
        let mut attempts = 0u32;
        let mut skipped: Vec<SkippedEngine> = Vec::new();
        let cancel_token = self.cancellation.register(request.cancel_key.as_deref());

        for engine_id in &chain {
            if attempts >= max_attempts {
                break;
            }

            let Some(engine) = self.registry.get(engine_id) else {
                skipped.push(SkippedEngine::not_found_in_registry(engine_id.as_str()));
                continue;
            };

            let internet_status = self.health.check();
            if engine.requires_internet() && internet_status != InternetStatus::Ok {
                skipped.push(SkippedEngine::no_internet(engine_id.as_str()));
                continue;
            }

            attempts += 1;
            // A misconfigured primary that was skipped above never incremented
            // `attempts`, so the first engine actually attempted is `Primary`
            // regardless of its position in `chain` (spec.md §8.4 scenario 5).
            let mode = if attempts == 1 { TraceMode::Primary } else { TraceMode::Fallback };

            let mut params = engine.default_params.clone();
            params.extend(plan.params.clone());
            let timeout = Duration::from_millis(plan.timeouts_ms.total_ms);

            let result = self
                .call_adapter(&engine, &request.payload.messages, timeout, &params, cancel_token.clone())
                .await;

            if !result.success && result.error.as_deref() == Some(Self::CANCELLED_REASON) {
                self.metrics.record(&engine.engine_id, result.latency_ms, false);
                self.emit_engine_selection(
                    request,
                    &engine.engine_id,
                    mode,
                    Some(Self::CANCELLED_REASON),
                    false,
                );
                self.unregister_cancellation(request);
                return RouteEnvelope::cancelled(attempts, Some(plan.clone()), skipped, internet_status);
            }

            if result.success && !result.response.is_empty() {
                let cost_usd = result.cost_usd_estimated;
                if let Some(max_cost) = request.max_cost_usd {
                    if cost_usd > max_cost {
                        self.metrics.record(&engine.engine_id, result.latency_ms, false);
                        self.emit_engine_selection(
                            request,
                            &engine.engine_id,
                            mode,
                            Some("cost_limit_exceeded"),
                            false,
                        );
                        continue;
                    }
                }

                self.metrics.record(&engine.engine_id, result.latency_ms, true);
                self.emit_routing(request, &engine);
                self.emit_engine_selection(request, &engine.engine_id, mode, None, false);
                self.unregister_cancellation(request);

                return RouteEnvelope {
                    response: result.response,
                    llm_used: engine.provider_family.as_str().to_string(),
                    engine_id: Some(engine.engine_id.clone()),
                    model_selected: Some(result.model),
                    latency_ms: result.latency_ms,
                    input_tokens: result.input_tokens,
                    output_tokens: result.output_tokens,
                    cost_usd,
                    fallback_used: attempts > 1,
                    attempts,
                    inference_plan: Some(plan.clone()),
                    skipped_engines: skipped,
                    internet_status,
                    degraded: plan
                        .trace_tags
                        .get("degraded")
                        .and_then(serde_json::Value::as_bool)
                        .unwrap_or(false),
                    cancelled: false,
                };
            }

            self.metrics.record(&engine.engine_id, result.latency_ms, false);
            let advance = should_advance(&plan.attempt_policy.retry_on, &result);
            self.emit_engine_selection(
                request,
                &engine.engine_id,
                mode,
                result.error.as_deref(),
                false,
            );
            if !advance {
                break;
            }
            tokio::time::sleep(self.backoff.delay_for_attempt(attempts - 1)).await;
        }

        self.emit_degraded(request, "chain_exhausted");
        self.unregister_cancellation(request);
        RouteEnvelope {
            response: RouteEnvelope::DEGRADED_PLACEHOLDER.to_string(),
            llm_used: "degraded_fallback".to_string(),
            engine_id: None,
            model_selected: None,
            latency_ms: 0,
            input_tokens: 0,
            #[allow(clippy::cast_possible_truncation)]
            output_tokens: RouteEnvelope::DEGRADED_PLACEHOLDER.split_whitespace().count() as u32,
            cost_usd: 0.0,
            fallback_used: attempts > 1,
            attempts,
            inference_plan: Some(plan.clone()),
            skipped_engines: skipped,
            internet_status: self.health.check(),
            degraded: true,
            cancelled: false,
        }
    }

    async fn route_legacy(&self, request: &InferenceRequest) -> RouteEnvelope {
        let last_user_text = request
            .payload
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let profile = classify_query(last_user_text);

        let mut scored: Vec<(Engine, f64)> = Vec::new();
        for family in LEGACY_PROVIDER_ORDER {
            let Some(adapter) = self.adapters.get(&family) else {
                continue;
            };
            if !adapter.is_available() {
                continue;
            }
            let Some(engine) = self
                .registry
                .list(&EngineFilter::all().with_provider_family(family))
                .into_iter()
                .next()
            else {
                continue;
            };

            let stats = self.metrics.stats(&engine.engine_id, family);
            #[allow(clippy::cast_precision_loss)]
            let mut score = (1.0 / (stats.latency_p95_ms.max(1) as f64))
                * stats.availability
                * (1.0 - stats.error_rate_1h)
                * engine.cost_factor.max(0.01);

            if profile.has_code && family == ProviderFamily::Vllm {
                score += 0.3;
            }
            if profile.is_general && family == ProviderFamily::Groq {
                score += 0.2;
            }
            if profile.is_complex && family == ProviderFamily::Anthropic {
                score += 0.3;
            }
            if let Some(budget_ms) = request.max_latency_ms {
                if stats.latency_p95_ms > budget_ms {
                    score *= 0.65;
                }
            }

            scored.push((engine, score));
        }
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.engine_id.cmp(&b.0.engine_id))
        });

        self.run_shadow_hook(request, scored.first().map(|(e, _)| e.engine_id.clone()), profile);

        let cancel_token = self.cancellation.register(request.cancel_key.as_deref());
        let mut attempts = 0u32;
        for (idx, (engine, _score)) in scored.iter().enumerate() {
            if attempts >= self.config.router_max_attempts {
                break;
            }
            attempts += 1;

            let timeout = request
                .max_latency_ms
                .map(Duration::from_millis)
                .unwrap_or(self.config.router_default_timeout);
            let result = self
                .call_adapter(
                    engine,
                    &request.payload.messages,
                    timeout,
                    &engine.default_params,
                    cancel_token.clone(),
                )
                .await;

            if !result.success && result.error.as_deref() == Some(Self::CANCELLED_REASON) {
                self.metrics.record(&engine.engine_id, result.latency_ms, false);
                self.emit_engine_selection(
                    request,
                    &engine.engine_id,
                    TraceMode::Fallback,
                    Some(Self::CANCELLED_REASON),
                    true,
                );
                self.unregister_cancellation(request);
                return RouteEnvelope::cancelled(attempts, None, Vec::new(), self.health.check());
            }

            if result.success && !result.response.is_empty() {
                self.metrics.record(&engine.engine_id, result.latency_ms, true);
                self.emit_engine_selection(
                    request,
                    &engine.engine_id,
                    if idx == 0 { TraceMode::Primary } else { TraceMode::Fallback },
                    None,
                    true,
                );
                self.unregister_cancellation(request);
                return RouteEnvelope {
                    response: result.response,
                    llm_used: engine.provider_family.as_str().to_string(),
                    engine_id: Some(engine.engine_id.clone()),
                    model_selected: Some(result.model),
                    latency_ms: result.latency_ms,
                    input_tokens: result.input_tokens,
                    output_tokens: result.output_tokens,
                    cost_usd: result.cost_usd_estimated,
                    fallback_used: idx > 0,
                    attempts,
                    inference_plan: None,
                    skipped_engines: Vec::new(),
                    internet_status: self.health.check(),
                    degraded: false,
                    cancelled: false,
                };
            }

            self.metrics.record(&engine.engine_id, result.latency_ms, false);
            self.emit_engine_selection(
                request,
                &engine.engine_id,
                TraceMode::Fallback,
                result.error.as_deref(),
                true,
            );
        }

        self.emit_degraded(request, "chain_exhausted");
        self.unregister_cancellation(request);
        RouteEnvelope {
            response: RouteEnvelope::DEGRADED_PLACEHOLDER.to_string(),
            llm_used: "degraded_fallback".to_string(),
            engine_id: None,
            model_selected: None,
            latency_ms: 0,
            input_tokens: 0,
            #[allow(clippy::cast_possible_truncation)]
            output_tokens: RouteEnvelope::DEGRADED_PLACEHOLDER.split_whitespace().count() as u32,
            cost_usd: 0.0,
            fallback_used: attempts > 1,
            attempts,
            inference_plan: None,
            skipped_engines: Vec::new(),
            internet_status: self.health.check(),
            degraded: true,
            cancelled: false,
        }
    }

    /// Shadow comparison (spec.md §4.6, §4.11): asks the Gateway Router
    /// what it would have selected, and writes a `SHADOW` comparison trace
    /// without affecting the real outcome. Gated by both
    /// `DenisConfig::shadow_comparison_enabled` flags; fail-open by
    /// construction since `GatewayRouter::resolve` never errors. No
    /// `tokio::time::timeout` wrapper is needed: the hook does only
    /// registry/seed-table reads, never an adapter call, so it cannot
    /// itself block past `gateway_shadow_timeout`.
    fn run_shadow_hook(&self, request: &InferenceRequest, legacy_engine_id: Option<EngineId>, profile: QueryProfile) {
        if !self.config.shadow_comparison_enabled() {
            return;
        }

        let intent = if profile.has_code {
            "code_generate"
        } else if profile.is_complex {
            "deep_audit"
        } else {
            "chat_general"
        };
        let route = self
            .gateway_router
            .resolve(intent, "*", self.health.check(), &self.registry);
        let shadow_engine_id = route.primary().cloned();
        let same_choice = matches!(
            (&legacy_engine_id, &shadow_engine_id),
            (Some(a), Some(b)) if a == b
        );

        let Ok(trace) = DecisionTrace::new(uuid::Uuid::new_v4().to_string(), TraceKind::EngineSelection, TraceMode::Shadow)
        else {
            return;
        };
        let trace = trace
            .with_request_id(request.request_id.to_string())
            .with_reason("gateway_shadow_compare")
            .with_extra(
                "legacy_provider",
                json!(legacy_engine_id.map_or_else(|| "none".to_string(), |id| id.to_string())),
            )
            .with_extra(
                "shadow_provider",
                json!(shadow_engine_id.map_or_else(|| "none".to_string(), |id| id.to_string())),
            )
            .with_extra("same_choice", json!(same_choice))
            .with_extra("shadow_task_profile", json!(route.task_profile_id));
        self.traces.emit(trace);
    }

    fn emit_routing(&self, request: &InferenceRequest, engine: &Engine) {
        let mode = routing_mode_for(engine);
        if let Ok(trace) = DecisionTrace::new(uuid::Uuid::new_v4().to_string(), TraceKind::Routing, mode) {
            self.traces.emit(
                trace
                    .with_request_id(request.request_id.to_string())
                    .with_engine(engine.engine_id.to_string()),
            );
        }
    }

    fn emit_engine_selection(
        &self,
        request: &InferenceRequest,
        engine_id: &EngineId,
        mode: TraceMode,
        reason: Option<&str>,
        legacy: bool,
    ) {
        let Ok(mut trace) = DecisionTrace::new(uuid::Uuid::new_v4().to_string(), TraceKind::EngineSelection, mode)
        else {
            tracing::warn!(?mode, "illegal trace mode for engine_selection");
            return;
        };
        trace = trace
            .with_request_id(request.request_id.to_string())
            .with_engine(engine_id.to_string());
        if let Some(reason) = reason {
            trace = trace.with_reason(reason.to_string());
        }
        if legacy {
            trace = trace
                .with_extra("mode_tag", json!("legacy_heuristic"))
                .with_extra("assumption", json!("derived_from_query_profile"));
        }
        self.traces.emit(trace);
    }

    fn emit_degraded(&self, request: &InferenceRequest, reason: &str) {
        if let Ok(trace) = DecisionTrace::new(uuid::Uuid::new_v4().to_string(), TraceKind::EngineSelection, TraceMode::Degraded) {
            self.traces.emit(
                trace
                    .with_request_id(request.request_id.to_string())
                    .with_reason(reason.to_string()),
            );
        }
    }
}
