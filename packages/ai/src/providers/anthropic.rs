//! Anthropic Claude provider implementation.
//!
//! The messages API has no JSON mode, so the answer is prefilled with `{`
//! and the opening brace is restored on the returned text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{JsonRequest, LlmProvider, next_key, send_error, status_error};
use crate::{AiError, ApiKeyRotation};

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    keys: Arc<ApiKeyRotation>,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    #[must_use]
    pub fn new(keys: Arc<ApiKeyRotation>, model: String) -> Self {
        Self {
            keys,
            model,
            client: super::http_client(),
        }
    }
}

/// Anthropic API request body.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Anthropic API response body.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Anthropic API error response.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate_json(&self, request: &JsonRequest<'_>) -> Result<String, AiError> {
        let api_key = next_key(&self.keys, "ANTHROPIC_API_KEY")?;

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: 1024,
            system: request.system_prompt,
            messages: vec![
                AnthropicMessage {
                    role: "user",
                    content: request.user_prompt,
                },
                AnthropicMessage {
                    role: "assistant",
                    content: "{",
                },
            ],
        };

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(self.name(), e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| send_error(self.name(), e))?;

        if !status.is_success() {
            return Err(status_error(self.name(), status, &text, |b| {
                serde_json::from_str::<AnthropicError>(b)
                    .ok()
                    .map(|e| e.error.message)
            }));
        }

        let response: AnthropicResponse = serde_json::from_str(&text)?;

        let answer: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect();

        if answer.trim().is_empty() {
            return Err(AiError::Provider {
                message: "No text in Anthropic response".to_string(),
            });
        }

        Ok(format!("{{{answer}"))
    }
}
