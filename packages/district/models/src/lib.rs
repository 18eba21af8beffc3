#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District reference data and risk record types.
//!
//! Defines the shapes shared by every dengue watch package: the static
//! district table, the ephemeral weather and risk readings produced by the
//! provider clients, the persisted [`DistrictRisk`] record, and the
//! severity tiers used for map and legend rendering.

pub mod districts;
pub mod health;
pub mod severity;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use districts::{District, find_district, sri_lanka_districts};
pub use severity::{BadgeVariant, LegendEntry, SeverityTier, legend};

/// Lowest valid risk level.
pub const MIN_RISK_LEVEL: u8 = 1;

/// Highest valid risk level.
pub const MAX_RISK_LEVEL: u8 = 10;

/// Errors raised when constructing model values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Risk level outside `1..=10`.
    #[error("invalid risk level {value}: expected 1-10")]
    InvalidRiskLevel {
        /// The rejected value.
        value: i64,
    },

    /// Assessment text was empty or whitespace.
    #[error("risk assessment text is empty")]
    EmptyAssessment,

    /// District name does not appear in the reference table.
    #[error("unknown district: {name}")]
    UnknownDistrict {
        /// The unrecognized name.
        name: String,
    },

    /// A health report failed validation.
    #[error("invalid health report: {message}")]
    InvalidReport {
        /// What was wrong with it.
        message: String,
    },
}

/// Mosquito breeding risk on a 1 (very low) to 10 (very high) scale.
///
/// The only way to obtain a value is through [`RiskLevel::new`] (or
/// deserialization, which goes through it), so an out-of-range level can
/// never reach the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RiskLevel(u8);

impl RiskLevel {
    /// Validates a raw risk level.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRiskLevel`] if `value` is not in `1..=10`.
    pub fn new(value: i64) -> Result<Self, ModelError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (MIN_RISK_LEVEL..=MAX_RISK_LEVEL).contains(v))
            .map(Self)
            .ok_or(ModelError::InvalidRiskLevel { value })
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RiskLevel {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RiskLevel> for u8 {
    fn from(level: RiskLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{MAX_RISK_LEVEL}", self.0)
    }
}

/// Current conditions at a district's representative coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage (0-100).
    pub humidity: f64,
    /// Rain accumulated over the preceding hour, in millimetres.
    pub rainfall: f64,
}

/// A validated risk judgement produced from a [`WeatherReading`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Breeding risk level.
    pub risk_level: RiskLevel,
    /// Short natural-language explanation.
    pub assessment: String,
}

impl RiskAssessment {
    /// Builds an assessment, rejecting empty explanations.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyAssessment`] if `assessment` is blank.
    pub fn new(risk_level: RiskLevel, assessment: impl Into<String>) -> Result<Self, ModelError> {
        let assessment = assessment.into();
        if assessment.trim().is_empty() {
            return Err(ModelError::EmptyAssessment);
        }
        Ok(Self {
            risk_level,
            assessment,
        })
    }
}

/// Cached risk record for one district, keyed by [`DistrictRisk::name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRisk {
    /// District name (matches [`District::name`]).
    pub name: String,
    /// Breeding risk level.
    pub risk_level: RiskLevel,
    /// Explanation returned alongside the level.
    pub assessment: String,
    /// Temperature used for this assessment (°C).
    pub temperature: f64,
    /// Humidity used for this assessment (%).
    pub humidity: f64,
    /// Rainfall used for this assessment (mm, last hour).
    pub rainfall: f64,
    /// When this record was last computed.
    pub updated_at: DateTime<Utc>,
}

impl DistrictRisk {
    /// Combines a weather reading and its assessment into a record stamped
    /// at `updated_at`.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        weather: WeatherReading,
        assessment: RiskAssessment,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            risk_level: assessment.risk_level,
            assessment: assessment.assessment,
            temperature: weather.temperature,
            humidity: weather.humidity,
            rainfall: weather.rainfall,
            updated_at,
        }
    }

    /// Returns every field except the key, as written by a merge upsert.
    #[must_use]
    pub fn fields(&self) -> DistrictRiskFields {
        DistrictRiskFields {
            risk_level: self.risk_level,
            assessment: self.assessment.clone(),
            temperature: self.temperature,
            humidity: self.humidity,
            rainfall: self.rainfall,
            updated_at: self.updated_at,
        }
    }
}

/// The non-key fields of a [`DistrictRisk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRiskFields {
    /// Breeding risk level.
    pub risk_level: RiskLevel,
    /// Explanation returned alongside the level.
    pub assessment: String,
    /// Temperature (°C).
    pub temperature: f64,
    /// Humidity (%).
    pub humidity: f64,
    /// Rainfall (mm, last hour).
    pub rainfall: f64,
    /// Computation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DistrictRiskFields {
    /// Attaches the key to produce a full record.
    #[must_use]
    pub fn into_record(self, name: impl Into<String>) -> DistrictRisk {
        DistrictRisk {
            name: name.into(),
            risk_level: self.risk_level,
            assessment: self.assessment,
            temperature: self.temperature,
            humidity: self.humidity,
            rainfall: self.rainfall,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_accepts_full_range() {
        for v in 1..=10 {
            assert_eq!(i64::from(RiskLevel::new(v).unwrap().value()), v);
        }
    }

    #[test]
    fn risk_level_rejects_out_of_range() {
        for v in [-1, 0, 11, 256] {
            assert_eq!(
                RiskLevel::new(v),
                Err(ModelError::InvalidRiskLevel { value: v })
            );
        }
    }

    #[test]
    fn risk_level_deserialization_is_validated() {
        assert!(serde_json::from_str::<RiskLevel>("7").is_ok());
        assert!(serde_json::from_str::<RiskLevel>("0").is_err());
        assert!(serde_json::from_str::<RiskLevel>("42").is_err());
    }

    #[test]
    fn blank_assessment_is_rejected() {
        let level = RiskLevel::new(4).unwrap();
        assert_eq!(
            RiskAssessment::new(level, "   "),
            Err(ModelError::EmptyAssessment)
        );
    }

    #[test]
    fn district_risk_serializes_camel_case() {
        let risk = DistrictRisk {
            name: "Colombo".to_string(),
            risk_level: RiskLevel::new(8).unwrap(),
            assessment: "Warm and humid".to_string(),
            temperature: 30.0,
            humidity: 85.0,
            rainfall: 2.0,
            updated_at: "2026-10-15T08:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["riskLevel"], 8);
        assert_eq!(json["updatedAt"], "2026-10-15T08:00:00Z");
        assert_eq!(json["name"], "Colombo");
    }

    #[test]
    fn fields_round_trip_into_record() {
        let risk = DistrictRisk {
            name: "Kandy".to_string(),
            risk_level: RiskLevel::new(3).unwrap(),
            assessment: "Cool".to_string(),
            temperature: 21.5,
            humidity: 60.0,
            rainfall: 0.0,
            updated_at: "2026-10-15T08:00:00Z".parse().unwrap(),
        };
        assert_eq!(risk.fields().into_record("Kandy"), risk);
    }
}
