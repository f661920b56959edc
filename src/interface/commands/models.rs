//! # Models Command
//!
//! Handles `models [--agent NAME]`.
//! Lists the models available to one agent's provider account. Independent of
//! the dispatcher and the cache.

use anyhow::{Context, Result};

use crate::domain::config::{AgentConfig, AppConfig};
use crate::infrastructure::llm::list_models;
use crate::strings::messages;

/// The named agent, or the head of the fallback chain.
pub fn select_agent<'a>(config: &'a AppConfig, name: Option<&str>) -> Result<(&'a str, &'a AgentConfig)> {
    match name {
        Some(name) => config
            .agents
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| messages::unknown_agent(name)),
        None => config
            .chain()
            .into_iter()
            .next()
            .context("No agents configured"),
    }
}

pub async fn handle_models(config: &AppConfig, agent: Option<&str>) -> Result<()> {
    let (name, agent_config) = select_agent(config, agent)?;
    tracing::info!("Listing models for {} ({})", name, agent_config.provider);

    let models = list_models(agent_config)
        .await
        .map_err(|e| anyhow::anyhow!(messages::models_failed(&e.to_string())))?;

    println!("{}", messages::models_table(&models));
    Ok(())
}
