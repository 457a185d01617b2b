//! HTTP client for an OpenAI-compatible generative AI provider.

use async_openai::types::chat::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, CreateChatCompletionResponse, ResponseFormat,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use url::Url;

use super::{GenerationError, Result};
use crate::config::AiConfig;

/// Chat and image calls against the configured provider.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    chat_model: String,
    image_model: String,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("base_url", &self.base_url.as_str())
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

/// Options for a single chat completion
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the model for a JSON object
    pub json: bool,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl AiClient {
    /// Build a client from configuration. Returns `None` when no API key is set.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty())?;

        crate::ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create AI provider HTTP client");

        // Url::join drops the last path segment unless the base ends with '/'
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Some(Self {
            http,
            base_url,
            api_key,
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| GenerationError::Provider(format!("invalid provider URL: {e}")))?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("AI provider returned {}: {}", status, detail);
            return Err(GenerationError::Provider(format!("HTTP {status}")));
        }

        Ok(response)
    }

    /// Run a system + user chat completion and return the first choice's text.
    #[instrument(skip_all, fields(model = %self.chat_model, json = options.json), err)]
    pub async fn chat(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String> {
        let request = CreateChatCompletionRequest {
            model: self.chat_model.clone(),
            messages: vec![
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.to_string()),
                    ..Default::default()
                }
                .into(),
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(user.to_string()),
                    ..Default::default()
                }
                .into(),
            ],
            temperature: options.temperature,
            max_completion_tokens: options.max_tokens,
            response_format: options.json.then_some(ResponseFormat::JsonObject),
            ..Default::default()
        };

        let completion: CreateChatCompletionResponse = self
            .post("chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidOutput(format!("unreadable chat completion: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::InvalidOutput("no content returned".to_string()))
    }

    /// Generate one 1024x1024 image and return its (temporary) URL.
    #[instrument(skip_all, fields(model = %self.image_model), err)]
    pub async fn image(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
            "quality": "standard",
        });

        let images: ImagesResponse = self
            .post("images/generations", &body)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidOutput(format!("unreadable image response: {e}")))?;

        images
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| GenerationError::InvalidOutput("no image URL returned".to_string()))
    }
}
