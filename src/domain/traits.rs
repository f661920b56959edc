//! # Domain Traits
//!
//! Abstract interface for a model backend.
//! Concrete adapters live in the Infrastructure layer.

use async_trait::async_trait;

use crate::domain::types::Error;

/// One provider/model pair behind a uniform call contract
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Agent name from configuration (e.g. "gemini-pro")
    fn name(&self) -> &str;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Send the prompt in exactly one round trip and return the response text.
    async fn invoke(&self, prompt: &str) -> Result<String, Error>;

    /// Advisory token count for the prompt, or `TOKENS_UNKNOWN`.
    async fn estimate_tokens(&self, prompt: &str) -> i64;
}
