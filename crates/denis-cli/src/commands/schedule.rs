//! `denis schedule` — assemble an `InferencePlan` without executing it
//! (spec.md §4.4, §6.7).

use crate::output::{self, CommandResult, OutputFormat};
use crate::registry_file;
use clap::Args;
use denis_core::{InferenceRequest, Message, RequestId};
use denis_health::InternetHealth;
use denis_routing::Scheduler;
use std::path::PathBuf;

/// Arguments shared by `schedule` and `route`: the request to assemble a
/// plan (or a routed response) for.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Path to a JSON engine registry descriptor.
    #[arg(long)]
    pub registry: PathBuf,

    /// Fail registry load on an unrecognized provider family.
    #[arg(long, default_value_t = false)]
    pub strict_registry: bool,

    /// Coarse routing category (drives the scheduler's parallelism limit).
    #[arg(long, default_value = "chat")]
    pub route_type: String,

    /// Fine-grained task classification.
    #[arg(long, default_value = "chat_general")]
    pub task_type: String,

    /// The user message to route.
    #[arg(long)]
    pub message: String,

    /// Output token ceiling.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Caller's latency ceiling, in milliseconds.
    #[arg(long)]
    pub max_latency_ms: Option<u64>,

    /// Caller's cost ceiling, in USD.
    #[arg(long)]
    pub max_cost_usd: Option<f64>,
}

impl RequestArgs {
    /// Build the `InferenceRequest` these arguments describe.
    pub fn build_request(&self) -> anyhow::Result<InferenceRequest> {
        let mut builder = InferenceRequest::builder(RequestId::generate())
            .route_type(self.route_type.clone())
            .task_type(self.task_type.clone())
            .message(Message::user(self.message.clone()));

        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_latency_ms) = self.max_latency_ms {
            builder = builder.max_latency_ms(max_latency_ms);
        }
        if let Some(max_cost_usd) = self.max_cost_usd {
            builder = builder.max_cost_usd(max_cost_usd);
        }

        builder
            .build()
            .map_err(|err| anyhow::anyhow!("building request: {err}"))
    }
}

/// Arguments for the `schedule` subcommand.
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

/// Execute `denis schedule`: run the [`Scheduler`] alone and print the
/// resulting plan (or the reason none could be produced) without making
/// any adapter call.
pub async fn execute(args: ScheduleArgs, json: bool) -> anyhow::Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let registry = registry_file::load_registry(&args.request.registry, args.request.strict_registry)?;
    let request = args.request.build_request()?;
    let scheduler = Scheduler::new(registry, InternetHealth::new());

    match scheduler.assign(&request) {
        Ok(plan) => match format {
            OutputFormat::Json => CommandResult::success(plan).print(format),
            OutputFormat::Text => {
                output::success("plan assembled");
                output::key_value("primary", plan.primary_engine_id.as_str());
                output::key_value("fallbacks", &format!("{:?}", plan.fallback_engine_ids));
                output::key_value("planned_tokens", &plan.budget.planned_tokens.to_string());
                Ok(())
            }
        },
        Err(outcome) => {
            let message = format!("no plan assembled: {outcome:?}");
            match format {
                OutputFormat::Json => CommandResult::<()>::failure(message).print(format),
                OutputFormat::Text => {
                    output::error(&message);
                    Ok(())
                }
            }
        }
    }
}
