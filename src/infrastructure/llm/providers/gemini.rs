//! Gemini provider
//!
//! Talks to Google AI Studio with an API key by default. When a `project_id` is
//! configured the same model is reached through Vertex AI instead, with the key
//! sent as a bearer access token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{ProviderConfig, http_client, read_json};
use crate::domain::traits::ModelAdapter;
use crate::domain::types::{Error, ModelInfo, Provider, TOKENS_UNKNOWN};

const AI_STUDIO_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_LOCATION: &str = "us-central1";

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Gemini content (message)
#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// Generation configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModelInfo>,
}

#[derive(Debug, Deserialize)]
struct GeminiModelInfo {
    name: String,
}

pub struct GeminiAdapter {
    name: String,
    config: ProviderConfig,
    client: Client,
}

impl GeminiAdapter {
    pub fn new(name: &str, config: ProviderConfig) -> Result<Self, Error> {
        let client = http_client(Provider::Gemini, config.timeout)?;
        Ok(Self {
            name: name.to_string(),
            config,
            client,
        })
    }

    fn is_vertex(&self) -> bool {
        self.config.project_id.is_some()
    }

    /// URL for a model method such as `generateContent` or `countTokens`
    fn method_url(&self, method: &str) -> String {
        let model = &self.config.model;
        match &self.config.project_id {
            Some(project) => {
                let location = self.config.location.as_deref().unwrap_or(DEFAULT_LOCATION);
                let base_url = match &self.config.base_url {
                    Some(url) => url.trim_end_matches('/').to_string(),
                    None => format!("https://{}-aiplatform.googleapis.com", location),
                };
                format!(
                    "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
                    base_url, project, location, model, method
                )
            }
            None => format!("{}/v1beta/models/{}:{}", self.ai_studio_base(), model, method),
        }
    }

    fn ai_studio_base(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(AI_STUDIO_BASE_URL)
            .trim_end_matches('/')
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.is_vertex() {
            builder.bearer_auth(&self.config.api_key)
        } else {
            builder.query(&[("key", self.config.api_key.as_str())])
        }
    }

    fn contents<'a>(prompt: &'a str) -> Vec<GeminiContent<'a>> {
        vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart { text: prompt }],
        }]
    }

    async fn count_tokens(&self, prompt: &str) -> Result<i64, Error> {
        let request = GeminiRequest {
            contents: Self::contents(prompt),
            generation_config: None,
        };
        let response = self
            .authorized(self.client.post(self.method_url("countTokens")))
            .json(&request)
            .send()
            .await;
        let counted: CountTokensResponse = read_json(Provider::Gemini, response).await?;
        Ok(counted.total_tokens)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, Error> {
        if self.is_vertex() {
            return Err(Error::new(
                "gemini",
                "Model listing is only available with an AI Studio key",
            ));
        }

        let url = format!("{}/v1beta/models", self.ai_studio_base());
        let response = self.authorized(self.client.get(&url)).send().await;
        let list: GeminiModelList = read_json(Provider::Gemini, response).await?;

        Ok(list
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m
                    .name
                    .strip_prefix("models/")
                    .map(str::to_string)
                    .unwrap_or(m.name),
                created: None,
            })
            .collect())
    }
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String, Error> {
        let generation_config =
            if self.config.temperature.is_some() || self.config.max_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_tokens,
                })
            } else {
                None
            };

        let request = GeminiRequest {
            contents: Self::contents(prompt),
            generation_config,
        };

        let response = self
            .authorized(self.client.post(self.method_url("generateContent")))
            .json(&request)
            .send()
            .await;
        let gemini_response: GeminiResponse = read_json(Provider::Gemini, response).await?;

        let Some(candidate) = gemini_response.candidates.into_iter().next() else {
            let reason = gemini_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("No candidates in response (blocked: {})", r))
                .unwrap_or_else(|| "No candidates in response".to_string());
            return Err(Error::new("gemini", reason));
        };

        let content: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(Error::new("gemini", "Empty content in response"));
        }
        Ok(content)
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
