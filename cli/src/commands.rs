//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for scenario reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored event trail and final state
    Text,
    /// JSON report
    Json,
}

/// CLI arguments for stagegate
#[derive(Parser, Debug)]
#[command(name = "stagegate")]
#[command(author, version, about = "Readiness-gated stage transitions for multi-party chat")]
#[command(long_about = r#"
stagegate coordinates participants in a shared chat session. Each participant
toggles readiness to end the current stage; once every participant on that
stage is ready, the session advances exactly once.

Scenarios are TOML files describing a session, its stages, its participants
and a list of steps (send / ready / unready / mediator / seed).

Configuration files are loaded from (in priority order):
1. --config <path>       Explicit config file
2. ./stagegate.toml      Project-level config
3. ~/.config/stagegate/config.toml   Global config

Example:
  stagegate run demos/three_way_chat.toml
  stagegate run --concurrent --output json demos/three_way_chat.toml
  stagegate config
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit operation logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scenario file against an in-memory session
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Run each participant's steps on its own blocking task
        #[arg(long)]
        concurrent: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Write the JSONL transcript here (overrides [transcript])
        #[arg(long, value_name = "PATH")]
        transcript: Option<PathBuf>,
    },

    /// Show configuration file locations and the effective configuration
    Config,
}
