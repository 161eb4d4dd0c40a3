//! CLI entrypoint for stagegate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod output;
mod scenario;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use colored::Colorize;
use commands::{Cli, Command, OutputFormat};
use output::ConsoleFormatter;
use scenario::{Scenario, ScenarioRunner};
use stagegate_application::TranscriptLogger;
use stagegate_infrastructure::{ConfigLoader, FileConfig, JsonlTranscriptLogger};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    init_tracing(cli.verbose, cli.log_json || config.log.json);
    info!("Starting stagegate");

    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            eprintln!("{} {}", "error:".red().bold(), issue.message);
        } else {
            warn!("{}", issue.message);
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Configuration has errors");
    }

    match cli.command {
        Command::Config => {
            ConfigLoader::print_config_sources();
            println!();
            println!("Effective configuration:");
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Run {
            scenario,
            concurrent,
            output,
            transcript,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let mut runner = ScenarioRunner::new(config.to_coordination_config());
            if let Some(sink) = transcript_sink(&config, transcript) {
                runner = runner.with_transcript_sink(sink);
            }

            let report = runner.run(&scenario, concurrent).await?;
            let rendered = match output {
                OutputFormat::Text => ConsoleFormatter::format(&report),
                OutputFormat::Json => ConsoleFormatter::format_json(&report),
            };
            println!("{}", rendered);

            if report.failed_steps() > 0 {
                warn!(failed = report.failed_steps(), "Some steps failed");
            }
            Ok(())
        }
    }
}

/// Initialize logging from `RUST_LOG`, or else the verbosity level. Logs go
/// to stderr so that `--output json` stays machine-readable.
fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// The JSONL transcript file, from `--transcript` or `[transcript]`
fn transcript_sink(
    config: &FileConfig,
    explicit: Option<std::path::PathBuf>,
) -> Option<Arc<dyn TranscriptLogger>> {
    let path = explicit.or_else(|| config.transcript.resolved_path())?;
    let logger = JsonlTranscriptLogger::new(&path)?;
    info!(path = %path.display(), "Writing transcript");
    Some(Arc::new(logger))
}
