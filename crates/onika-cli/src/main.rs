//! Onika CLI — entry point.
//!
//! # Commands
//!
//! - `onika ask -m MESSAGE` — route one message and print the outcome
//! - `onika chat` — interactive REPL, one independent route per line
//! - `onika status` — config path, layer table, budget, provider keys
//! - `onika onboard` — write the default config
//! - `onika gateway` — run the chat front-ends and the budget rollover

mod gateway;
mod helpers;
mod onboard;
mod repl;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use onika_core::config::{load_config, Config};
use onika_providers::{HttpUpstream, LayerRegistry};
use onika_router::{BudgetTracker, Router};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🎸 Onika — free-first multi-provider LLM router
#[derive(Parser)]
#[command(name = "onika", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a single message and print the answer
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: String,

        /// Print the outcome as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Interactive chat (each line is routed on its own)
    Chat {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration, layers and budget
    Status,

    /// Write the default configuration
    Onboard,

    /// Run chat channels and the daily budget rollover
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            message,
            json,
            logs,
        } => {
            init_logging(logs);
            run_ask(&message, json).await
        }
        Commands::Chat { logs } => {
            init_logging(logs);
            let router = build_router(&load_config(None))?;
            repl::run(router).await
        }
        Commands::Status => {
            init_logging(false);
            status::run()
        }
        Commands::Onboard => onboard::run(),
        Commands::Gateway { logs } => {
            init_logging(logs);
            gateway::run().await
        }
    }
}

async fn run_ask(message: &str, json: bool) -> Result<()> {
    let router = build_router(&load_config(None))?;
    info!(chars = message.chars().count(), "routing single message");

    let outcome = router.route(message).await;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
        );
    } else {
        helpers::print_outcome(&outcome);
    }
    Ok(())
}

/// Wire registry, budget, HTTP client and router from config.
pub fn build_router(config: &Config) -> Result<Arc<Router>> {
    config.budget.validate().context("invalid budget config")?;
    let registry = LayerRegistry::from_config(&config.layers).context("invalid layer table")?;
    let budget = BudgetTracker::new(config.budget.daily_limit);
    let client = HttpUpstream::new(&config.providers, &config.router, &config.app)?;

    let router = Router::new(
        Arc::new(registry),
        Arc::new(budget),
        Arc::new(client),
        config.router.clone(),
    )
    .context("invalid router settings")?;

    Ok(Arc::new(router))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("onika=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
