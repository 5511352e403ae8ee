//! GuIA Worker Binary
//!
//! Entry point for the guide-generation worker: loads configuration, reads a
//! queue event from a file or stdin, and processes every record in the batch.

use anyhow::Context;
use clap::Parser;
use guia::completion::RetryingCompletionClient;
use guia::config::GuiaConfig;
use guia::generator::SectionGuideGenerator;
use guia::logging::init_logging;
use guia::message::QueueEvent;
use guia::orchestrator::{ProjectOrchestrator, RunOutcome};
use guia::project::HttpProjectService;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "guia-worker", about = "Process queued guide-generation requests")]
struct Cli {
    /// Queue event JSON file; reads stdin when omitted
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Configuration file (TOML); GUIA_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Override log format (json or text)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match GuiaConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }

    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("GuIA worker starting");

    match run(&cli, &config).await {
        Ok(summary) => {
            info!("Batch processed");
            println!("{}", summary);
        }
        Err(e) => {
            error!("Worker failed: {:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli, config: &GuiaConfig) -> anyhow::Result<String> {
    let raw = read_event(cli).context("failed to read queue event")?;
    let event: QueueEvent = serde_json::from_str(&raw).context("invalid queue event")?;

    let client = RetryingCompletionClient::from_config(&config.completion, &config.prompts)?;
    let generator = SectionGuideGenerator::new(client, &config.prompts);
    let projects = Arc::new(HttpProjectService::new(&config.project_api_url)?);
    let orchestrator = ProjectOrchestrator::new(projects, generator);

    let outcomes = orchestrator.process_event(&event).await;
    Ok(summarize(&outcomes))
}

fn read_event(cli: &Cli) -> std::io::Result<String> {
    match &cli.event {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn summarize(outcomes: &[RunOutcome]) -> String {
    let mut lines = vec![format!("processed {} record(s)", outcomes.len())];

    for (index, outcome) in outcomes.iter().enumerate() {
        let line = match outcome {
            RunOutcome::Completed {
                sections,
                succeeded,
            } => format!(
                "record {}: completed, {}/{} sections succeeded",
                index, succeeded, sections
            ),
            RunOutcome::DecodeFailed => format!("record {}: decode failed", index),
            RunOutcome::ProjectMissing => format!("record {}: project unavailable", index),
            RunOutcome::AlreadyRunning => format!("record {}: guide already running", index),
            RunOutcome::LockFailed => format!("record {}: lock not acquired", index),
            RunOutcome::ContextFailed => {
                format!("record {}: context summarization failed", index)
            }
        };
        lines.push(line);
    }

    lines.join("\n")
}
