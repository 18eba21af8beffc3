//! Weather-to-risk inference.
//!
//! [`LlmRiskAssessor`] asks a generative model to judge breeding risk from
//! current conditions. Model output is untrusted: it must parse as JSON,
//! carry an integral `riskLevel` in `1..=10`, and a non-empty
//! `assessment`, or the whole answer is rejected.

use std::sync::Arc;

use dengue_watch_district_models::{RiskAssessment, RiskLevel, WeatherReading};

use crate::AiError;
use crate::providers::{JsonRequest, LlmProvider, strip_code_fence};

const SYSTEM_PROMPT: &str = "\
You are a public health expert in entomology and epidemiology working on \
dengue control in Sri Lanka. You judge how favourable current weather is \
for Aedes aegypti and Culex mosquito breeding.

Guidance:
- Mosquitoes thrive in warm, humid conditions.
- Any rainfall creates new breeding sites in containers and puddles.
- Aedes aegypti breeds best between 24°C and 28°C.
- High humidity lets adult mosquitoes live longer.

Answer only with a JSON object of the form \
{\"riskLevel\": <integer 1-10>, \"assessment\": \"<one or two sentences>\"} \
where 1 is very low risk and 10 is very high risk.";

/// Something that can turn a weather reading into a risk assessment.
#[async_trait::async_trait]
pub trait RiskInference: Send + Sync {
    /// Assesses breeding risk for the given conditions.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] on provider failure or when the model's answer
    /// fails validation.
    async fn assess_risk(&self, weather: &WeatherReading) -> Result<RiskAssessment, AiError>;
}

/// [`RiskInference`] backed by an [`LlmProvider`].
pub struct LlmRiskAssessor {
    provider: Arc<dyn LlmProvider>,
    schema: serde_json::Value,
}

impl LlmRiskAssessor {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            schema: output_schema(),
        }
    }
}

#[async_trait::async_trait]
impl RiskInference for LlmRiskAssessor {
    async fn assess_risk(&self, weather: &WeatherReading) -> Result<RiskAssessment, AiError> {
        let user_prompt = build_prompt(weather);
        let request = JsonRequest {
            system_prompt: SYSTEM_PROMPT,
            user_prompt: &user_prompt,
            schema: &self.schema,
        };

        let text = self.provider.generate_json(&request).await?;
        let assessment = parse_assessment(&text);
        if let Err(e) = &assessment {
            log::debug!("Rejected {} output: {e}; raw: {text}", self.provider.name());
        }
        assessment
    }
}

/// Response schema in the `OpenAPI` subset Gemini accepts.
fn output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "riskLevel": {
                "type": "INTEGER",
                "description": "Predicted mosquito breeding risk from 1 (very low) to 10 (very high)."
            },
            "assessment": {
                "type": "STRING",
                "description": "Brief explanation of the risk level based on the weather."
            }
        },
        "required": ["riskLevel", "assessment"]
    })
}

fn build_prompt(weather: &WeatherReading) -> String {
    format!(
        "Current weather at the location:\n\
         - Temperature: {:.1}°C\n\
         - Humidity: {:.0}%\n\
         - Rainfall (last hour): {:.1} mm\n\n\
         Give the mosquito breeding risk level and a concise assessment.",
        weather.temperature, weather.humidity, weather.rainfall
    )
}

/// Parses and validates the model's JSON answer.
#[allow(clippy::cast_possible_truncation)]
fn parse_assessment(text: &str) -> Result<RiskAssessment, AiError> {
    let value: serde_json::Value =
        serde_json::from_str(strip_code_fence(text)).map_err(|e| AiError::InvalidOutput {
            message: format!("not JSON: {e}"),
        })?;

    let raw_level = &value["riskLevel"];
    let level = raw_level
        .as_i64()
        .or_else(|| {
            raw_level
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        })
        .ok_or_else(|| AiError::InvalidOutput {
            message: format!("riskLevel is not an integer: {raw_level}"),
        })?;

    let risk_level = RiskLevel::new(level).map_err(|e| AiError::InvalidOutput {
        message: e.to_string(),
    })?;

    let assessment = value["assessment"]
        .as_str()
        .ok_or_else(|| AiError::InvalidOutput {
            message: "assessment is missing".to_string(),
        })?;

    RiskAssessment::new(risk_level, assessment.trim()).map_err(|e| AiError::InvalidOutput {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedProvider {
        answer: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn generate_json(&self, request: &JsonRequest<'_>) -> Result<String, AiError> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.user_prompt.to_string());
            self.answer.clone().map_err(|()| AiError::RateLimited {
                provider: "canned".to_string(),
            })
        }
    }

    const WEATHER: WeatherReading = WeatherReading {
        temperature: 30.0,
        humidity: 85.0,
        rainfall: 2.0,
    };

    #[test]
    fn parses_valid_answer() {
        let a = parse_assessment(r#"{"riskLevel": 8, "assessment": "Warm and wet"}"#).unwrap();
        assert_eq!(a.risk_level.value(), 8);
        assert_eq!(a.assessment, "Warm and wet");
    }

    #[test]
    fn accepts_integral_float_level() {
        let a = parse_assessment(r#"{"riskLevel": 6.0, "assessment": "Humid"}"#).unwrap();
        assert_eq!(a.risk_level.value(), 6);
    }

    #[test]
    fn accepts_fenced_answer() {
        let a = parse_assessment("```json\n{\"riskLevel\": 2, \"assessment\": \"Dry\"}\n```")
            .unwrap();
        assert_eq!(a.risk_level.value(), 2);
    }

    #[test]
    fn rejects_out_of_range_levels() {
        for raw in [
            r#"{"riskLevel": 0, "assessment": "x"}"#,
            r#"{"riskLevel": 11, "assessment": "x"}"#,
            r#"{"riskLevel": -3, "assessment": "x"}"#,
        ] {
            assert!(
                matches!(parse_assessment(raw), Err(AiError::InvalidOutput { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_fractional_or_string_levels() {
        assert!(parse_assessment(r#"{"riskLevel": 7.5, "assessment": "x"}"#).is_err());
        assert!(parse_assessment(r#"{"riskLevel": "7", "assessment": "x"}"#).is_err());
    }

    #[test]
    fn rejects_missing_or_blank_assessment() {
        assert!(parse_assessment(r#"{"riskLevel": 5}"#).is_err());
        assert!(parse_assessment(r#"{"riskLevel": 5, "assessment": "  "}"#).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_assessment("Risk is high"),
            Err(AiError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn prompt_includes_readings() {
        let prompt = build_prompt(&WEATHER);
        assert!(prompt.contains("30.0°C"));
        assert!(prompt.contains("85%"));
        assert!(prompt.contains("2.0 mm"));
    }

    #[tokio::test]
    async fn assessor_returns_validated_assessment() {
        let provider = CannedProvider::new(r#"{"riskLevel": 8, "assessment": "High risk"}"#);
        let assessor = LlmRiskAssessor::new(provider.clone());

        let a = assessor.assess_risk(&WEATHER).await.unwrap();

        assert_eq!(a.risk_level.value(), 8);
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assessor_rejects_invalid_model_output() {
        let provider = CannedProvider::new(r#"{"riskLevel": 12, "assessment": "Off the chart"}"#);
        let assessor = LlmRiskAssessor::new(provider);

        assert!(matches!(
            assessor.assess_risk(&WEATHER).await,
            Err(AiError::InvalidOutput { .. })
        ));
    }

    #[tokio::test]
    async fn assessor_propagates_provider_failure() {
        let assessor = LlmRiskAssessor::new(CannedProvider::failing());
        assert!(matches!(
            assessor.assess_risk(&WEATHER).await,
            Err(AiError::RateLimited { .. })
        ));
    }
}
