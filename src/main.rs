//! # Main Entry Point
//!
//! Sends a prompt to a chain of hosted LLM providers, falling back in order
//! until one answers:
//! - Domain: Configuration, Types and the adapter contract
//! - Infrastructure: Provider adapters, Response cache, Call log
//! - Application: Fallback dispatcher
//! - Interface: Command handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::domain::config::AppConfig;
use crate::interface::commands;

#[derive(Parser, Debug)]
#[command(name = "llm-fallback")]
#[command(about = "Send a prompt to the first LLM provider that answers, with a local response cache")]
struct Cli {
    /// Configuration file (default: data/config.yaml when present, else the built-in chain)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch a prompt through the fallback chain
    Call {
        /// Prompt text, or `-` to read it from stdin
        prompt: String,
        /// Skip the response cache for this call
        #[arg(long)]
        no_cache: bool,
    },
    /// List the models available to one agent's account
    Models {
        /// Agent name (default: first in the fallback order)
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Print each agent's token estimate for a prompt
    Tokens {
        /// Prompt text, or `-` to read it from stdin
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    infrastructure::logging::init_console();

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!(
        "Fallback order: {} (cache: {})",
        config.fallback.join(" -> "),
        if config.cache.enabled {
            config.cache.path.display().to_string()
        } else {
            "disabled".to_string()
        }
    );

    match cli.command {
        Command::Call { prompt, no_cache } => {
            commands::call::handle_call(&config, &prompt, !no_cache).await
        }
        Command::Models { agent } => commands::models::handle_models(&config, agent.as_deref()).await,
        Command::Tokens { prompt } => commands::tokens::handle_tokens(&config, &prompt).await,
    }
}
