//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` endpoint with `responseMimeType` set to
//! `application/json` so the model answers with a bare JSON document.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{JsonRequest, LlmProvider, next_key, send_error, status_error};
use crate::{AiError, ApiKeyRotation};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API provider.
pub struct GeminiProvider {
    keys: Arc<ApiKeyRotation>,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider. Each request uses the next key from
    /// `keys`.
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
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GeminiResponse) -> Result<String, AiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::Provider {
            message: "No text in Gemini response".to_string(),
        });
    }
    Ok(text)
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_json(&self, request: &JsonRequest<'_>) -> Result<String, AiError> {
        let api_key = next_key(&self.keys, "GEMINI_API_KEY")?;

        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: request.system_prompt,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: request.user_prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: request.schema,
            },
        };

        let resp = self
            .client
            .post(format!("{BASE_URL}/{}:generateContent", self.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(self.name(), e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| send_error(self.name(), e))?;

        if !status.is_success() {
            return Err(status_error(self.name(), status, &text, |b| {
                serde_json::from_str::<GeminiError>(b)
                    .ok()
                    .map(|e| e.error.message)
            }));
        }

        extract_text(serde_json::from_str(&text)?)
    }
}
