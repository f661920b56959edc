//! # LLM Providers
//!
//! Adapters for each supported wire protocol:
//! - OpenAI-compatible chat completions (OpenAI, OpenRouter)
//! - Anthropic Messages API, with optional extended thinking
//! - Gemini `generateContent`, on AI Studio or Vertex AI
//!
//! Each adapter implements `ModelAdapter`. `build_adapter` picks one from an
//! agent's configuration.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAIAdapter;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::config::AgentConfig;
use crate::domain::traits::ModelAdapter;
use crate::domain::types::{Error, ModelInfo, Provider, TOKENS_UNKNOWN};

/// Configuration for a provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key (or Vertex access token)
    pub api_key: String,
    /// Base URL (for non-default endpoints)
    pub base_url: Option<String>,
    pub model: String,
    /// Timeout in seconds
    pub timeout: Option<u64>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub thinking_budget: Option<u32>,
    pub reasoning_effort: Option<String>,
    pub project_id: Option<String>,
    pub location: Option<String>,
}

impl ProviderConfig {
    pub fn from_agent_config(provider: Provider, config: &AgentConfig) -> Result<Self, Error> {
        let api_key = if let Some(key) = config.api_key.as_ref().filter(|k| !k.is_empty()) {
            key.clone()
        } else {
            let env_var = config
                .api_key_env
                .as_deref()
                .unwrap_or_else(|| provider.default_key_env());
            std::env::var(env_var).map_err(|e| {
                Error::new(
                    provider.as_str(),
                    format!("API key env var {} not set: {}", env_var, e),
                )
            })?
        };

        Ok(Self {
            api_key,
            base_url: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            thinking_budget: config.thinking_budget,
            reasoning_effort: config.reasoning_effort.clone(),
            project_id: config.project_id.clone(),
            location: config.location.clone(),
        })
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// One client per adapter; nothing is pooled across dispatches.
fn http_client(provider: Provider, timeout: Option<u64>) -> Result<Client, Error> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout {
        builder = builder.timeout(std::time::Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| Error::new(provider.as_str(), format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success HTTP response body into an `Error`.
///
/// Prefers the `error.message` field every supported API uses.
fn api_error(provider: Provider, status: reqwest::StatusCode, body: &str) -> Error {
    if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(error_msg) = error_json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Error::new(provider.as_str(), format!("HTTP {}: {}", status, error_msg));
        }
    }
    Error::new(provider.as_str(), format!("HTTP {}: {}", status, body))
}

/// Read a response, mapping transport and status failures to `Error`.
async fn read_json<T: serde::de::DeserializeOwned>(
    provider: Provider,
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, Error> {
    let response = response
        .map_err(|e| Error::new(provider.as_str(), format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(api_error(provider, status, &error_text));
    }

    response
        .json()
        .await
        .map_err(|e| Error::new(provider.as_str(), format!("Failed to parse response: {}", e)))
}

/// Build the adapter for one configured agent.
///
/// Configuration problems (unknown provider, missing key) do not abort the
/// chain: they produce an adapter whose every call fails with that problem.
pub fn build_adapter(name: &str, config: &AgentConfig) -> Box<dyn ModelAdapter> {
    match try_build_adapter(name, config) {
        Ok(adapter) => adapter,
        Err(error) => Box::new(MisconfiguredAdapter {
            name: name.to_string(),
            model: config.model.clone(),
            error,
        }),
    }
}

fn try_build_adapter(name: &str, config: &AgentConfig) -> Result<Box<dyn ModelAdapter>, Error> {
    let provider = Provider::from_str(&config.provider)
        .ok_or_else(|| Error::new(&config.provider, "Unknown provider"))?;
    let provider_config = ProviderConfig::from_agent_config(provider, config)?;

    Ok(match provider {
        Provider::OpenAI | Provider::OpenRouter => {
            Box::new(OpenAIAdapter::new(name, provider, provider_config)?)
        }
        Provider::Anthropic => Box::new(AnthropicAdapter::new(name, provider_config)?),
        Provider::Gemini => Box::new(GeminiAdapter::new(name, provider_config)?),
    })
}

/// List the models available to an agent's account.
pub async fn list_models(config: &AgentConfig) -> Result<Vec<ModelInfo>, Error> {
    let provider = Provider::from_str(&config.provider)
        .ok_or_else(|| Error::new(&config.provider, "Unknown provider"))?;
    let provider_config = ProviderConfig::from_agent_config(provider, config)?;

    match provider {
        Provider::OpenAI | Provider::OpenRouter => {
            OpenAIAdapter::new("models", provider, provider_config)?
                .list_models()
                .await
        }
        Provider::Anthropic => {
            AnthropicAdapter::new("models", provider_config)?
                .list_models()
                .await
        }
        Provider::Gemini => GeminiAdapter::new("models", provider_config)?.list_models().await,
    }
}

/// Stand-in for an agent that could not be built
struct MisconfiguredAdapter {
    name: String,
    model: String,
    error: Error,
}

#[async_trait]
impl ModelAdapter for MisconfiguredAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, _prompt: &str) -> Result<String, Error> {
        Err(self.error.clone())
    }

    async fn estimate_tokens(&self, _prompt: &str) -> i64 {
        TOKENS_UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(provider: &str) -> AgentConfig {
        AgentConfig {
            provider: provider.to_string(),
            model: "some-model".to_string(),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_inline_key_wins() {
        let config = ProviderConfig::from_agent_config(Provider::OpenAI, &agent("openai")).unwrap();
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "some-model");
    }

    #[test]
    fn test_missing_key_env_is_an_error() {
        let config = AgentConfig {
            api_key: None,
            api_key_env: Some("LLM_FALLBACK_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..agent("anthropic")
        };
        let err = ProviderConfig::from_agent_config(Provider::Anthropic, &config).unwrap_err();
        assert_eq!(err.provider, "anthropic");
        assert!(err.message.contains("LLM_FALLBACK_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_api_error_prefers_message_field() {
        let body = r#"{"error": {"message": "Invalid API key", "code": 401}}"#;
        let err = api_error(Provider::OpenRouter, reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(err.to_string(), "[openrouter] HTTP 401 Unauthorized: Invalid API key");

        let err = api_error(Provider::Gemini, reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.message, "HTTP 502 Bad Gateway: upstream down");
    }

    #[tokio::test]
    async fn test_misconfigured_agent_fails_on_invoke() {
        let config = AgentConfig {
            api_key: None,
            api_key_env: Some("LLM_FALLBACK_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..agent("openrouter")
        };
        let adapter = build_adapter("broken", &config);
        assert_eq!(adapter.name(), "broken");
        assert_eq!(adapter.model(), "some-model");

        let err = adapter.invoke("hi").await.unwrap_err();
        assert!(err.message.contains("not set"));
        assert_eq!(adapter.estimate_tokens("hi").await, TOKENS_UNKNOWN);
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_on_invoke() {
        let adapter = build_adapter("odd", &agent("carrier-pigeon"));
        let err = adapter.invoke("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "[carrier-pigeon] Unknown provider");
    }

    #[test]
    fn test_build_adapter_selects_protocol() {
        assert_eq!(build_adapter("a", &agent("openai")).model(), "some-model");
        assert_eq!(build_adapter("b", &agent("anthropic")).name(), "b");
        assert_eq!(build_adapter("c", &agent("gemini")).name(), "c");
    }
}
