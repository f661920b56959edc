//! # Call Command
//!
//! Handles `call <PROMPT>`.
//! Runs the prompt through the fallback chain and prints the response to stdout.

use std::io::Read;

use anyhow::{Context, Result, bail};

use crate::application::dispatcher::{CallContext, Dispatcher};
use crate::domain::config::AppConfig;

/// `-` means "read the prompt from stdin".
pub fn resolve_prompt(arg: &str, mut stdin: impl Read) -> Result<String> {
    let prompt = if arg == "-" {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("Failed to read prompt from stdin")?;
        buf
    } else {
        arg.to_string()
    };

    if prompt.is_empty() {
        bail!(crate::strings::messages::EMPTY_PROMPT);
    }
    Ok(prompt)
}

pub async fn handle_call(config: &AppConfig, prompt: &str, use_cache: bool) -> Result<()> {
    let prompt = resolve_prompt(prompt, std::io::stdin())?;

    let context = CallContext::from_config(config)?;
    let dispatcher = Dispatcher::from_config(config, context);

    let response = dispatcher.dispatch(&prompt, use_cache).await?;
    println!("{}", response);
    Ok(())
}
