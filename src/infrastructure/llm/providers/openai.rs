//! OpenAI-compatible API provider
//!
//! Supports OpenAI and OpenRouter (or any other chat-completions endpoint set
//! through `endpoint`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ProviderConfig, http_client, read_json};
use crate::domain::traits::ModelAdapter;
use crate::domain::types::{Error, ModelInfo, Provider};
use crate::infrastructure::llm::tokens;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<bool>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    /// OpenRouter reports upstream failures inside a 200 body
    #[serde(default)]
    error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelList {
    #[serde(default)]
    data: Vec<OpenAIModelInfo>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelInfo {
    id: String,
    #[serde(default)]
    created: Option<i64>,
}

pub struct OpenAIAdapter {
    name: String,
    provider: Provider,
    config: ProviderConfig,
    client: Client,
}

impl OpenAIAdapter {
    pub fn new(name: &str, provider: Provider, config: ProviderConfig) -> Result<Self, Error> {
        let client = http_client(provider, config.timeout)?;
        Ok(Self {
            name: name.to_string(),
            provider,
            config,
            client,
        })
    }

    fn base_url(&self) -> &str {
        match (&self.config.base_url, self.provider) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, Provider::OpenRouter) => OPENROUTER_BASE_URL,
            (None, _) => OPENAI_BASE_URL,
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, Error> {
        let url = format!("{}/models", self.base_url());
        let response = self.client.get(&url).bearer_auth(&self.config.api_key).send().await;
        let list: OpenAIModelList = read_json(self.provider, response).await?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                created: m
                    .created
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                    .map(|dt| dt.format("%Y-%m-%d").to_string()),
            })
            .collect())
    }
}

#[async_trait]
impl ModelAdapter for OpenAIAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String, Error> {
        let provider = self.provider.as_str();
        let url = format!("{}/chat/completions", self.base_url());

        let request = OpenAIRequest {
            model: &self.config.model,
            messages: vec![OpenAIMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            reasoning_effort: self.config.reasoning_effort.as_deref(),
            // Only OpenAI itself understands `store`
            store: (self.provider == Provider::OpenAI).then_some(false),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await;
        let openai_response: OpenAIResponse = read_json(self.provider, response).await?;

        if let Some(error) = openai_response.error {
            return Err(Error::new(provider, error.message));
        }

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::new(provider, "No choices in response"))?;

        choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::new(provider, "Empty content in response"))
    }

    async fn estimate_tokens(&self, prompt: &str) -> i64 {
        tokens::estimate_by_family(&self.config.model, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TOKENS_UNKNOWN;

    fn config(base_url: &str, model: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: "test-key".to_string(),
            base_url: Some(base_url.to_string()),
            model: model.to_string(),
            timeout: Some(5),
            max_tokens: None,
            temperature: None,
            thinking_budget: None,
            reasoning_effort: Some("medium".to_string()),
            project_id: None,
            location: None,
        }
    }

    #[test]
    fn test_default_base_urls() {
        let mut cfg = config("x", "m");
        cfg.base_url = None;
        let openai = OpenAIAdapter::new("a", Provider::OpenAI, cfg.clone()).unwrap();
        assert_eq!(openai.base_url(), "https://api.openai.com/v1");
        let router = OpenAIAdapter::new("b", Provider::OpenRouter, cfg).unwrap();
        assert_eq!(router.base_url(), "https://openrouter.ai/api/v1");
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mut server = mockito::Server::new_async().await;
        let base_url = format!("{}/v1", server.url());

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model": "openai/o1", "messages": [{"role": "user", "content": "Say hello"}], "reasoning_effort": "medium"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "id": "gen-1",
                "choices": [{
                    "message": {"role": "assistant", "content": "Hello, world!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
            }"#,
            )
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("o1", Provider::OpenRouter, config(&base_url, "openai/o1")).unwrap();
        let text = adapter.invoke("Say hello").await.unwrap();

        assert_eq!(text, "Hello, world!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_sends_store_false() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"store": false}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "ok"}}]}"#)
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("gpt", Provider::OpenAI, config(&server.url(), "o1")).unwrap();
        assert_eq!(adapter.invoke("hi").await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("x", Provider::OpenRouter, config(&server.url(), "m")).unwrap();
        let err = adapter.invoke("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "[openrouter] No choices in response");
    }

    #[tokio::test]
    async fn test_null_content_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": null}}]}"#)
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("x", Provider::OpenRouter, config(&server.url(), "m")).unwrap();
        assert!(adapter.invoke("hi").await.is_err());
    }

    #[tokio::test]
    async fn test_error_inside_ok_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"error": {"message": "Provider returned error", "code": 502}}"#)
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("x", Provider::OpenRouter, config(&server.url(), "m")).unwrap();
        let err = adapter.invoke("hi").await.unwrap_err();
        assert_eq!(err.message, "Provider returned error");
    }

    #[tokio::test]
    async fn test_http_error_uses_api_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "No auth credentials found"}}"#)
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("x", Provider::OpenRouter, config(&server.url(), "m")).unwrap();
        let err = adapter.invoke("hi").await.unwrap_err();
        assert!(err.message.contains("401"));
        assert!(err.message.contains("No auth credentials found"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let adapter =
            OpenAIAdapter::new("x", Provider::OpenAI, config("http://127.0.0.1:9", "m")).unwrap();
        let err = adapter.invoke("hi").await.unwrap_err();
        assert!(err.message.starts_with("HTTP request failed"));
    }

    #[tokio::test]
    async fn test_list_models() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                r#"{"data": [
                    {"id": "o1", "created": 1734375816},
                    {"id": "gpt-4o", "created": null}
                ]}"#,
            )
            .create_async()
            .await;

        let adapter =
            OpenAIAdapter::new("x", Provider::OpenAI, config(&server.url(), "m")).unwrap();
        let models = adapter.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "o1");
        assert_eq!(models[0].created.as_deref(), Some("2024-12-16"));
        assert_eq!(models[1].created, None);
    }

    #[tokio::test]
    async fn test_estimate_tokens_by_family() {
        let known = OpenAIAdapter::new("x", Provider::OpenAI, config("http://x", "gpt-4o")).unwrap();
        assert_eq!(known.estimate_tokens("abcdefgh").await, 2);

        let unknown =
            OpenAIAdapter::new("x", Provider::OpenRouter, config("http://x", "acme/mystery-1")).unwrap();
        assert_eq!(unknown.estimate_tokens("abcdefgh").await, TOKENS_UNKNOWN);
    }
}
