//! `denis health` — report the current Internet Health status
//! (spec.md §4.2, §6.7).

use crate::output::{self, CommandResult, OutputFormat};
use clap::Args;
use denis_health::InternetHealth;
use serde::Serialize;

/// Arguments for the `health` subcommand.
#[derive(Args, Debug)]
pub struct HealthArgs {}

#[derive(Debug, Serialize)]
struct HealthOutput {
    status: String,
}

/// Execute `denis health`: a single, fresh-or-cached check against
/// [`InternetHealth`] (no server, no registry file needed).
pub fn execute(_args: HealthArgs, json: bool) -> anyhow::Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let health = InternetHealth::new();
    let status = health.check();
    let output = HealthOutput {
        status: status.to_string(),
    };

    match format {
        OutputFormat::Json => CommandResult::success(output).print(format),
        OutputFormat::Text => {
            output::key_value("internet_status", &output.status);
            Ok(())
        }
    }
}
