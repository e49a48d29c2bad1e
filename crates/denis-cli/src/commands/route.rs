//! `denis route` — assemble a plan (unless `--legacy` is given) and execute
//! it against the real provider adapters (spec.md §4.6, §6.7).

use crate::commands::schedule::RequestArgs;
use crate::output::{self, CommandResult, OutputFormat};
use crate::registry_file;
use clap::Args;
use denis_config::DenisConfig;
use denis_health::InternetHealth;
use denis_providers::{build_adapters, ProviderApiKeys};
use denis_routing::{Router, Scheduler};
use denis_telemetry::{MetricsStore, TraceSink};
use std::sync::Arc;

/// Arguments for the `route` subcommand.
#[derive(Args, Debug)]
pub struct RouteArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Skip the scheduler and use the legacy heuristic scorer instead of a
    /// plan.
    #[arg(long, default_value_t = false)]
    pub legacy: bool,
}

fn api_keys_from_env() -> ProviderApiKeys {
    ProviderApiKeys {
        groq: std::env::var("DENIS_GROQ_API_KEY").ok(),
        openrouter: std::env::var("DENIS_OPENROUTER_API_KEY").ok(),
        anthropic: std::env::var("DENIS_ANTHROPIC_API_KEY").ok(),
        perplexity: std::env::var("DENIS_PERPLEXITY_API_KEY").ok(),
    }
}

/// Execute `denis route`: build a [`Router`] over the real adapters and
/// route one request end to end, printing the resulting envelope.
pub async fn execute(args: RouteArgs, json: bool) -> anyhow::Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let registry = registry_file::load_registry(&args.request.registry, args.request.strict_registry)?;
    let request = args.request.build_request()?;
    let health = InternetHealth::new();
    let config = DenisConfig::from_env()?;

    let plan = if args.legacy {
        None
    } else {
        let scheduler = Scheduler::new(registry.clone(), InternetHealth::new());
        scheduler.assign(&request).ok()
    };

    let adapters = build_adapters(reqwest::Client::new(), &api_keys_from_env());
    let router = Router::new(
        registry,
        health,
        adapters,
        Arc::new(MetricsStore::new()),
        TraceSink::default(),
        config,
    );

    let envelope = router.route(&request, plan.as_ref()).await;

    match format {
        OutputFormat::Json => CommandResult::success(envelope).print(format),
        OutputFormat::Text => {
            output::key_value("llm_used", &envelope.llm_used);
            output::key_value("response", &envelope.response);
            output::key_value("degraded", &envelope.degraded.to_string());
            output::key_value("fallback_used", &envelope.fallback_used.to_string());
            output::key_value("attempts", &envelope.attempts.to_string());
            Ok(())
        }
    }
}
