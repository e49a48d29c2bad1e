//! CLI argument definitions using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// A thin command-line front end for the denis inference control plane,
/// operating over a static registry descriptor file.
#[derive(Parser, Debug)]
#[command(name = "denis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the current Internet Health status
    Health(commands::health::HealthArgs),

    /// Assemble an inference plan without executing it
    Schedule(commands::schedule::ScheduleArgs),

    /// Assemble (or skip) a plan and route a request end to end
    Route(commands::route::RouteArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Health(args) => commands::health::execute(args, self.json),
            Commands::Schedule(args) => commands::schedule::execute(args, self.json).await,
            Commands::Route(args) => commands::route::execute(args, self.json).await,
        }
    }
}
