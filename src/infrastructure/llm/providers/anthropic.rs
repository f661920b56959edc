//! Anthropic (Claude) provider
//!
//! Supports Claude models with optional extended thinking. Thinking blocks
//! are dropped from the returned text.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{ProviderConfig, http_client, read_json};
use crate::domain::traits::ModelAdapter;
use crate::domain::types::{Error, ModelInfo, Provider, TOKENS_UNKNOWN};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Room left for the answer once the thinking budget is spent
const ANSWER_HEADROOM: u32 = 1000;

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CountTokensRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicResponseContent>,
}

/// Anthropic response content block (`text`, `thinking`, ...)
#[derive(Debug, Deserialize)]
struct AnthropicResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountTokensResponse {
    input_tokens: i64,
}

/// Anthropic Models API response
#[derive(Debug, Deserialize)]
struct AnthropicModelList {
    #[serde(default)]
    data: Vec<AnthropicModelInfo>,
}

#[derive(Debug, Deserialize)]
struct AnthropicModelInfo {
    id: String,
    #[serde(default)]
    created_at: Option<String>,
}

pub struct AnthropicAdapter {
    name: String,
    config: ProviderConfig,
    client: Client,
}

impl AnthropicAdapter {
    pub fn new(name: &str, config: ProviderConfig) -> Result<Self, Error> {
        let client = http_client(Provider::Anthropic, config.timeout)?;
        Ok(Self {
            name: name.to_string(),
            config,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(ANTHROPIC_BASE_URL)
            .trim_end_matches('/');
        format!("{}{}", base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> AnthropicRequest<'a> {
        let configured = self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let messages = vec![AnthropicMessage {
            role: "user",
            content: prompt,
        }];

        match self.config.thinking_budget {
            // max_tokens must exceed the budget; temperature is not allowed with thinking
            Some(budget) => AnthropicRequest {
                model: &self.config.model,
                max_tokens: configured.max(budget.saturating_add(ANSWER_HEADROOM)),
                messages,
                temperature: None,
                thinking: Some(ThinkingConfig {
                    kind: "enabled",
                    budget_tokens: budget,
                }),
            },
            None => AnthropicRequest {
                model: &self.config.model,
                max_tokens: configured,
                messages,
                temperature: self.config.temperature,
                thinking: None,
            },
        }
    }

    async fn count_tokens(&self, prompt: &str) -> Result<i64, Error> {
        let request = CountTokensRequest {
            model: &self.config.model,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .authorized(self.client.post(self.url("/v1/messages/count_tokens")))
            .json(&request)
            .send()
            .await;
        let counted: CountTokensResponse = read_json(Provider::Anthropic, response).await?;
        Ok(counted.input_tokens)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, Error> {
        let response = self
            .authorized(self.client.get(self.url("/v1/models")))
            .send()
            .await;
        let list: AnthropicModelList = read_json(Provider::Anthropic, response).await?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                created: m.created_at.map(|raw| {
                    chrono::DateTime::parse_from_rfc3339(&raw)
                        .map(|dt| dt.format("%Y-%m-%d").to_string())
                        .unwrap_or(raw)
                }),
            })
            .collect())
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String, Error> {
        let request = self.build_request(prompt);
        let response = self
            .authorized(self.client.post(self.url("/v1/messages")))
            .json(&request)
            .send()
            .await;
        let anthropic_response: AnthropicResponse =
            read_json(Provider::Anthropic, response).await?;

        let text: Vec<String> = anthropic_response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(Error::new("anthropic", "No text content in response"));
        }
        Ok(text.join("\n"))
    }

    async fn estimate_tokens(&self, prompt: &str) -> i64 {
        match self.count_tokens(prompt).await {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!("Token count failed for {}: {}", self.name, e);
                TOKENS_UNKNOWN
            }
        }
    }
}
