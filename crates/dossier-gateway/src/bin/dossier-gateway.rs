//! Dossier Gateway Binary
//!
//! HTTP server for the two-stage report pipeline.
//!
//! # Usage
//! ```bash
//! dossier-gateway [--port 5000] [--host 0.0.0.0] [--config gateway.json] [--verbose]
//! ```

use anyhow::Context;
use clap::Parser;
use dossier_core::GenerationClient;
use dossier_gateway::{Gateway, GatewayConfig};
use dossier_providers::{build_provider, ProviderSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dossier Gateway - company reports over HTTP
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (default: $PORT or 5000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// JSON gateway configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON provider configuration file (API key still read from the environment)
    #[arg(long)]
    provider_config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing .env is fine; the variables may already be in the environment.
    dotenvy::dotenv().ok();

    init_tracing(args.verbose);

    let settings = match &args.provider_config {
        Some(path) => ProviderSettings::from_file(path)?,
        None => ProviderSettings::from_env()?,
    };
    let provider = build_provider(&settings).context("Failed to configure text provider")?;

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("Failed to load gateway config from {:?}", path))?,
        None => GatewayConfig::default(),
    }
    .with_env_overrides(|name| std::env::var(name).ok())?;
    if let Some(host) = args.host {
        config = config.with_host(host);
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    print_banner(&config, &settings.model);

    let gateway = Gateway::new(config, GenerationClient::new(provider));
    gateway.start().await?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }
}

fn print_banner(config: &GatewayConfig, model: &str) {
    println!();
    println!("Dossier Gateway v{}", dossier_gateway::VERSION);
    println!("   model: {}", model);
    println!();
    println!("HTTP Endpoints on http://{}:{}", config.host, config.port);
    println!("   ├─ GET  /                 Greeting");
    println!("   ├─ GET  /health           Health check");
    println!("   ├─ POST /api/generate-md  Company report");
    println!("   ├─ POST /api/analyze      Report analysis (alias /api/gemini)");
    println!("   ├─ POST /api/normalize    Input preview");
    println!("   └─ POST /api/render       Markdown blocks");
    println!();
    println!("Press Ctrl+C to stop the gateway");
    println!();
}
