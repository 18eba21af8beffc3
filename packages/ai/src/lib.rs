#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Mosquito breeding risk inference backed by a generative model.
//!
//! Supports Google Gemini (the default, with round-robin rotation across
//! several API keys), `OpenAI`, and Anthropic Claude through a common
//! [`providers::LlmProvider`] trait. [`risk::LlmRiskAssessor`] turns a
//! weather reading into a prompt, asks the provider for JSON, and
//! validates the answer before it is allowed anywhere near the cache.

pub mod keys;
pub mod providers;
pub mod risk;

use thiserror::Error;

pub use keys::ApiKeyRotation;
pub use risk::{LlmRiskAssessor, RiskInference};

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider rejected the request for exceeding its rate limit.
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// Provider name.
        provider: String,
    },

    /// The provider did not answer within the configured timeout.
    #[error("Request to {provider} timed out")]
    Timeout {
        /// Provider name.
        provider: String,
    },

    /// The model answered, but not with a usable risk assessment.
    #[error("Invalid model output: {message}")]
    InvalidOutput {
        /// Why the output was rejected.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}
