#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Current-weather client for district risk assessment.
//!
//! Wraps the `OpenWeatherMap` current weather endpoint and normalizes its
//! response into a [`WeatherReading`]. Every call issues exactly one
//! request with caching disabled; staleness is decided by the caller, so
//! an intermediary must never serve an old observation.
//!
//! See <https://openweathermap.org/current>

use std::time::Duration;

use dengue_watch_district_models::WeatherReading;
use thiserror::Error;

/// Default `OpenWeatherMap` current weather endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Environment variable holding the `OpenWeatherMap` API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur while fetching weather.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Weather provider returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for operator logs.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Weather response parse error: {message}")]
    Parse {
        /// Description of what was missing.
        message: String,
    },
}

/// Source of current weather observations.
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches current conditions at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] on any transport, status, or parse failure.
    /// Callers treat this as "no data for this cycle".
    async fn fetch_weather(&self, lat: f64, lng: f64) -> Result<WeatherReading, WeatherError>;
}

/// `OpenWeatherMap` API client.
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    /// Creates a client against the public endpoint.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Creates a client against a custom endpoint (proxies, test servers).
    #[must_use]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build weather HTTP client ({e}), using defaults");
                reqwest::Client::new()
            });
        Self {
            api_key,
            base_url,
            client,
        }
    }

    /// Creates a client from `OPENWEATHER_API_KEY` (and the optional
    /// `OPENWEATHER_BASE_URL` override).
    ///
    /// Returns `None` when the key is missing or blank, which callers use
    /// to switch into cache-only mode.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Creates a client from an already-resolved key, honouring the
    /// `OPENWEATHER_BASE_URL` override. A missing or blank key gives `None`.
    #[must_use]
    pub fn from_key(api_key: Option<String>) -> Option<Self> {
        let Some(api_key) = configured_key(api_key) else {
            log::warn!("{API_KEY_ENV} is not set; live weather is disabled");
            return None;
        };
        let base_url =
            std::env::var("OPENWEATHER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Some(Self::with_base_url(api_key, base_url))
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_weather(&self, lat: f64, lng: f64) -> Result<WeatherReading, WeatherError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .header(reqwest::header::CACHE_CONTROL, "no-cache, no-store")
            .header(reqwest::header::PRAGMA, "no-cache")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse {
                message: format!("invalid JSON: {e}"),
            })?;
        parse_response(&json)
    }
}

/// Treats a blank key the same as a missing one.
fn configured_key(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Extracts `main.temp`, `main.humidity`, and `rain.1h` (0 when absent).
fn parse_response(body: &serde_json::Value) -> Result<WeatherReading, WeatherError> {
    let main = body.get("main").ok_or_else(|| WeatherError::Parse {
        message: "Missing main block in weather response".to_string(),
    })?;

    let temperature = main["temp"].as_f64().ok_or_else(|| WeatherError::Parse {
        message: "Missing main.temp in weather response".to_string(),
    })?;

    let humidity = main["humidity"]
        .as_f64()
        .ok_or_else(|| WeatherError::Parse {
            message: "Missing main.humidity in weather response".to_string(),
        })?;

    let rainfall = body
        .get("rain")
        .and_then(|r| r["1h"].as_f64())
        .unwrap_or(0.0);

    Ok(WeatherReading {
        temperature,
        humidity,
        rainfall,
    })
}
