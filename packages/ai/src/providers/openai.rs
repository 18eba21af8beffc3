//! `OpenAI` GPT provider implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{JsonRequest, LlmProvider, next_key, send_error, status_error};
use crate::{AiError, ApiKeyRotation};

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    keys: Arc<ApiKeyRotation>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    #[must_use]
    pub fn new(keys: Arc<ApiKeyRotation>, model: String) -> Self {
        Self {
            keys,
            model,
            client: super::http_client(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    response_format: ResponseFormat,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_json(&self, request: &JsonRequest<'_>) -> Result<String, AiError> {
        let api_key = next_key(&self.keys, "OPENAI_API_KEY")?;

        let body = OpenAiRequest {
            model: &self.model,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: request.system_prompt,
                },
                OpenAiMessage {
                    role: "user",
                    content: request.user_prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            max_tokens: 1024,
        };

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(self.name(), e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| send_error(self.name(), e))?;

        if !status.is_success() {
            return Err(status_error(self.name(), status, &text, |b| {
                serde_json::from_str::<OpenAiError>(b)
                    .ok()
                    .map(|e| e.error.message)
            }));
        }

        let response: OpenAiResponse = serde_json::from_str(&text)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AiError::Provider {
                message: "No content in OpenAI response".to_string(),
            })
    }
}
