use anyhow::Context;
use clap::{Parser, Subcommand};
use dossier_core::{GenerationClient, Normalizer, StageOrchestrator, SubmitOutcome};
use dossier_providers::{build_provider, ProviderSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod repl;
mod terminal;

/// Dossier - company reports from a text-generation provider
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Run {
        /// Use this text as the first input
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Generate a report for one subject and exit
    Report {
        /// Company name or description
        subject: String,

        /// Also run the analysis stage
        #[arg(long)]
        analyze: bool,

        /// Print the final pipeline snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the input normalizer extracts from some text
    Preview {
        text: String,
    },

    /// Render a markdown file for the terminal
    Render {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Run { input } => {
            let orchestrator = StageOrchestrator::new(generation_client()?);
            let stdin = std::io::stdin();
            repl::Repl::new(&orchestrator, stdin.lock()).run(input).await?;
        }
        Commands::Report {
            subject,
            analyze,
            json,
        } => {
            let orchestrator = StageOrchestrator::new(generation_client()?);
            run_report(&orchestrator, &subject, analyze, json).await?;
        }
        Commands::Preview { text } => {
            let normalized = Normalizer::default().normalize(&text);
            let preview = serde_json::json!({
                "rule": normalized.rule().map(|r| r.as_str()).unwrap_or("raw"),
                "record": normalized.record(),
            });
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Commands::Render { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            print!("{}", terminal::format_blocks(&dossier_core::render(&content)));
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn generation_client() -> anyhow::Result<GenerationClient> {
    let settings = ProviderSettings::from_env()?;
    tracing::debug!(model = %settings.model, base_url = %settings.base_url, "Provider settings loaded");
    let provider = build_provider(&settings).context("Failed to configure text provider")?;
    Ok(GenerationClient::new(provider))
}

async fn run_report(
    orchestrator: &StageOrchestrator,
    subject: &str,
    analyze: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut outcome = orchestrator
        .submit(subject)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if analyze && orchestrator.snapshot().run.report_content().is_some() {
        outcome = orchestrator
            .submit_analysis()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&orchestrator.snapshot())?);
    } else {
        let snapshot = orchestrator.snapshot();
        for result in [&snapshot.run.generated, &snapshot.run.analyzed]
            .into_iter()
            .flatten()
            .filter(|r| r.is_success())
        {
            terminal::print_stage(result);
        }
    }

    match outcome {
        SubmitOutcome::Completed(result) if !result.is_success() => {
            let message = result.error_message.unwrap_or_default();
            terminal::print_error(&message);
            anyhow::bail!("{} stage failed", result.stage)
        }
        _ => Ok(()),
    }
}
