//! LLM provider abstraction and implementations.
//!
//! Supports Google Gemini, `OpenAI`, and Anthropic via a common trait. Each
//! provider answers a single-turn request with a JSON document as text;
//! interpreting that JSON is the caller's job.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use crate::{AiError, ApiKeyRotation};

/// Default per-request timeout for model calls.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A single-turn request for a JSON answer.
#[derive(Debug, Clone, Copy)]
pub struct JsonRequest<'a> {
    /// Role and rules for the model.
    pub system_prompt: &'a str,
    /// The concrete question.
    pub user_prompt: &'a str,
    /// Response schema, for providers that can enforce one.
    pub schema: &'a serde_json::Value,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs and errors.
    fn name(&self) -> &'static str;

    /// Sends the request and returns the raw text of the model's answer.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails, is rate limited, times out,
    /// or the provider returns no text.
    async fn generate_json(&self, request: &JsonRequest<'_>) -> Result<String, AiError>;
}

/// Builds the shared HTTP client with the configured timeout
/// (`AI_TIMEOUT_SECS`, default 30).
pub(crate) fn http_client() -> reqwest::Client {
    let secs = std::env::var("AI_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    reqwest::Client::builder()
        .timeout(Duration::from_secs(secs))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build AI HTTP client ({e}), using defaults");
            reqwest::Client::new()
        })
}

/// Maps a transport error, distinguishing timeouts.
pub(crate) fn send_error(provider: &str, e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        AiError::Http(e)
    }
}

/// Maps a non-success status and body to an error.
///
/// `extract_message` pulls the provider's own error message out of the
/// body when it has one.
pub(crate) fn status_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
    extract_message: impl Fn(&str) -> Option<String>,
) -> AiError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return AiError::RateLimited {
            provider: provider.to_string(),
        };
    }
    AiError::Provider {
        message: extract_message(body).unwrap_or_else(|| format!("HTTP {status}: {body}")),
    }
}

/// Takes the next key from a rotation or reports that none are configured.
pub(crate) fn next_key<'a>(keys: &'a ApiKeyRotation, env_hint: &str) -> Result<&'a str, AiError> {
    keys.next().ok_or_else(|| AiError::Config {
        message: format!("{env_hint} environment variable not set"),
    })
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `GEMINI_API_KEY` or `GEMINI_API_KEY_1..5` set -> Gemini
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 3. `OPENAI_API_KEY` set -> `OpenAI`
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Arc<dyn LlmProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());

    match provider.to_lowercase().as_str() {
        "gemini" | "google" | "googleai" => {
            let keys = ApiKeyRotation::from_env("GEMINI_API_KEY");
            if keys.is_empty() {
                return Err(AiError::Config {
                    message: "GEMINI_API_KEY (or GEMINI_API_KEY_1..5) not set".to_string(),
                });
            }
            let model = std::env::var("AI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
            Ok(Arc::new(gemini::GeminiProvider::new(Arc::new(keys), model)))
        }
        "anthropic" | "claude" => {
            let api_key = configured_key(std::env::var("ANTHROPIC_API_KEY").ok()).ok_or_else(|| {
                AiError::Config {
                    message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
                }
            })?;
            let model = std::env::var("AI_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
            Ok(Arc::new(anthropic::AnthropicProvider::new(
                Arc::new(ApiKeyRotation::single(api_key)),
                model,
            )))
        }
        "openai" | "gpt" => {
            let api_key = configured_key(std::env::var("OPENAI_API_KEY").ok()).ok_or_else(|| {
                AiError::Config {
                    message: "OPENAI_API_KEY environment variable not set".to_string(),
                }
            })?;
            let model = std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
            Ok(Arc::new(openai::OpenAiProvider::new(
                Arc::new(ApiKeyRotation::single(api_key)),
                model,
            )))
        }
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'gemini', 'anthropic', or 'openai'."
            ),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    if !ApiKeyRotation::from_env("GEMINI_API_KEY").is_empty() {
        log::info!("Auto-detected AI provider: Gemini (GEMINI_API_KEY found)");
        return "gemini".to_string();
    }

    if configured_key(std::env::var("ANTHROPIC_API_KEY").ok()).is_some() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    if configured_key(std::env::var("OPENAI_API_KEY").ok()).is_some() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY found)");
        return "openai".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set one of: GEMINI_API_KEY (or GEMINI_API_KEY_1..5), \
         ANTHROPIC_API_KEY, or OPENAI_API_KEY. You can also set AI_PROVIDER explicitly."
    );

    // Fall back to gemini; will produce a clear error about the missing key
    "gemini".to_string()
}

/// Treats a blank key the same as a missing one.
fn configured_key(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Strips a Markdown code fence some models wrap JSON answers in.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
