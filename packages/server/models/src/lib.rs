#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the dengue watch server.
//!
//! These types are serialized to JSON for the REST API and the refresh
//! event stream. They wrap the domain records rather than replace them so
//! the stored shapes can evolve separately from the API contract.

use dengue_watch_district_models::DistrictRisk;
use dengue_watch_district_models::health::DistrictCaseSummary;
use dengue_watch_risk::{DashboardSummary, NationalTotals, RefreshStatus};
use serde::{Deserialize, Serialize};

/// Message shown when the refresh ran without provider credentials.
pub const NOT_CONFIGURED_MESSAGE: &str = "Live risk assessment is not configured. Set \
     OPENWEATHER_API_KEY and an AI provider key to enable it; showing cached data only.";

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Client configuration exposed to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Whether live weather lookups and risk inference are available.
    pub weather_configured: bool,
    /// `MapTiler` key for the base map, if set.
    pub map_tile_key: Option<String>,
}

/// Outcome of a refresh as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiRefreshStatus {
    /// The cycle ran against live providers.
    Refreshed,
    /// Credentials are missing; data is cache-only.
    NotConfigured,
}

/// Per-cycle counts, present when the cycle ran against live providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRefreshCounts {
    /// Records served from the cache.
    pub reused: usize,
    /// Districts recomputed.
    pub recomputed: usize,
    /// Districts that failed and kept their previous record.
    pub failed: usize,
}

/// Response of `GET /api/district-risks` and the final stream event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDistrictRisks {
    /// Whether the cycle ran live.
    pub status: ApiRefreshStatus,
    /// Explanatory message for the not-configured state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Cycle counts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<ApiRefreshCounts>,
    /// One record per computed district, in district-table order.
    pub risks: Vec<DistrictRisk>,
    /// Dashboard summary derived from `risks`.
    pub summary: DashboardSummary,
}

impl ApiDistrictRisks {
    /// Wraps a refresh result.
    #[must_use]
    pub fn new(status: RefreshStatus, risks: Vec<DistrictRisk>, summary: DashboardSummary) -> Self {
        let (status, message, counts) = match status {
            RefreshStatus::Refreshed {
                reused,
                recomputed,
                failed,
            } => (
                ApiRefreshStatus::Refreshed,
                None,
                Some(ApiRefreshCounts {
                    reused,
                    recomputed,
                    failed,
                }),
            ),
            RefreshStatus::NotConfigured => (
                ApiRefreshStatus::NotConfigured,
                Some(NOT_CONFIGURED_MESSAGE.to_string()),
                None,
            ),
        };

        Self {
            status,
            message,
            counts,
            risks,
            summary,
        }
    }
}

/// Query parameters for the district risk endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRisksQuery {
    /// Length of the summary's top list (default 5).
    pub top: Option<usize>,
}

/// Events sent over `GET /api/district-risks/stream`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RefreshEvent {
    /// Some districts have resolved.
    Progress {
        /// Districts resolved so far (reused or attempted).
        resolved: u64,
        /// Districts in this cycle.
        total: u64,
    },
    /// The cycle finished.
    Complete {
        /// Same payload as `GET /api/district-risks`.
        payload: Box<ApiDistrictRisks>,
    },
    /// The cycle could not run.
    Error {
        /// Error message.
        message: String,
    },
}

impl RefreshEvent {
    /// SSE `event:` name for this variant.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

/// Query parameters for `GET /api/health-reports`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReportsQuery {
    /// Restrict to one district.
    pub district: Option<String>,
}

/// Response of `GET /api/health-reports/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCaseSummary {
    /// Per-district totals in table order.
    pub districts: Vec<DistrictCaseSummary>,
    /// Country-wide totals.
    pub national: NationalTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_summary() -> DashboardSummary {
        DashboardSummary::build(&[], &[], 5)
    }

    #[test]
    fn not_configured_carries_message() {
        let api = ApiDistrictRisks::new(RefreshStatus::NotConfigured, Vec::new(), empty_summary());
        let json = serde_json::to_value(&api).unwrap();

        assert_eq!(json["status"], "notConfigured");
        assert_eq!(json["message"], NOT_CONFIGURED_MESSAGE);
        assert!(json.get("counts").is_none());
        assert_eq!(json["risks"], serde_json::json!([]));
    }

    #[test]
    fn refreshed_carries_counts() {
        let api = ApiDistrictRisks::new(
            RefreshStatus::Refreshed {
                reused: 20,
                recomputed: 4,
                failed: 1,
            },
            Vec::new(),
            empty_summary(),
        );
        let json = serde_json::to_value(&api).unwrap();

        assert_eq!(json["status"], "refreshed");
        assert!(json.get("message").is_none());
        assert_eq!(json["counts"]["recomputed"], 4);
    }

    #[test]
    fn events_are_tagged() {
        let event = RefreshEvent::Progress {
            resolved: 3,
            total: 25,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(event.name(), "progress");
        assert_eq!(json["type"], "progress");
        assert_eq!(json["resolved"], 3);
        assert_eq!(json["total"], 25);
    }
}
