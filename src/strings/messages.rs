//! # Messages
//!
//! Constant strings and format functions for user-facing output.

use crate::domain::types::{ModelInfo, TOKENS_UNKNOWN};

pub const EMPTY_PROMPT: &str = "Prompt is empty.";
pub const NOT_AVAILABLE: &str = "N/A";

pub fn unknown_agent(name: &str) -> String {
    format!("Agent `{name}` is not configured.")
}

pub fn models_failed(err: &str) -> String {
    format!("Error: Failed to retrieve models: {err}")
}

/// Render a model list, sorted by id, followed by its total.
pub fn models_table(models: &[ModelInfo]) -> String {
    let mut sorted: Vec<&ModelInfo> = models.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(60)));
    out.push_str(&format!("{:<40} {:<20}\n", "ID", "Created"));
    out.push_str(&format!("{} {}\n", "-".repeat(40), "-".repeat(20)));
    for model in sorted {
        let created = model.created.as_deref().unwrap_or(NOT_AVAILABLE);
        out.push_str(&format!("{:<40} {:<20}\n", model.id, created));
    }
    out.push_str(&format!("{}\n", "=".repeat(60)));
    out.push_str(&format!("Total models available: {}", models.len()));
    out
}

pub fn token_estimate(agent: &str, tokens: i64) -> String {
    if tokens == TOKENS_UNKNOWN {
        format!("{agent:<24} unknown")
    } else {
        format!("{agent:<24} {tokens}")
    }
}
