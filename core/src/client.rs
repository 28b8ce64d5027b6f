use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::ChatSettings;
use crate::errors::{CoreError, CoreResult};
use crate::types::*;

/// A hosted chat completion service
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends `messages` and returns the generated reply text.
    async fn complete(&self, messages: &[ChatMessage], options: GenerationOptions)
        -> CoreResult<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Client for the Groq OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    settings: ChatSettings,
}

impl GroqClient {
    /// Create a new Groq API client
    pub fn new(api_key: impl Into<String>, settings: ChatSettings) -> CoreResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "API key is required to initialize the chat client".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CoreError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatProvider for GroqClient {
    #[instrument(skip(self, messages), fields(model = %self.settings.model_name, count = messages.len()))]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: GenerationOptions,
    ) -> CoreResult<String> {
        let request = ChatCompletionRequest {
            model: &self.settings.model_name,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoreError::ResponseError(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => api_error.error.to_string(),
                Err(_) => body,
            };
            return Err(CoreError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", message),
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CoreError::ParsingError(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        extract_reply(completion)
    }

    fn model_name(&self) -> &str {
        &self.settings.model_name
    }
}

/// Pulls the first choice's text out of a completion response
fn extract_reply(completion: ChatCompletionResponse) -> CoreResult<String> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::ResponseError("No choices in response".to_string()))?;

    if let Some(reason) = &choice.finish_reason {
        if reason != "stop" {
            warn!("Completion finish reason: {}", reason);
        }
    }

    choice
        .message
        .content
        .ok_or_else(|| CoreError::ResponseError("No content in choice".to_string()))
}
