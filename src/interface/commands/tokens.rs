//! # Tokens Command
//!
//! Handles `tokens <PROMPT>`.
//! Prints each adapter's advisory token estimate; nothing is enforced.

use anyhow::Result;

use crate::application::dispatcher::{CallContext, Dispatcher};
use crate::domain::config::AppConfig;
use crate::infrastructure::logging::CallLog;
use crate::strings::messages;

pub async fn handle_tokens(config: &AppConfig, prompt: &str) -> Result<()> {
    let prompt = super::call::resolve_prompt(prompt, std::io::stdin())?;

    // Estimates are not responses: no call log, no cache
    let context = CallContext::new(CallLog::disabled(), None);
    let dispatcher = Dispatcher::from_config(config, context);

    for (agent, tokens) in dispatcher.estimate_tokens(&prompt).await {
        println!("{}", messages::token_estimate(&agent, tokens));
    }
    Ok(())
}
