//! Dashboard views over a set of district risk records.
//!
//! Everything here is pure and works on whatever slice the caller holds,
//! so the same functions serve the HTTP API and the CLI.

use dengue_watch_district_models::{BadgeVariant, District, DistrictRisk, SeverityTier};
use serde::{Deserialize, Serialize};

/// Returns the record with the highest risk level. Ties go to the record
/// that appears first.
#[must_use]
pub fn highest_risk(risks: &[DistrictRisk]) -> Option<&DistrictRisk> {
    risks.iter().fold(None, |best, risk| match best {
        Some(b) if b.risk_level >= risk.risk_level => Some(b),
        _ => Some(risk),
    })
}

/// Returns up to `n` records ordered by descending risk level. Records with
/// equal levels keep their input order.
#[must_use]
pub fn top_n(risks: &[DistrictRisk], n: usize) -> Vec<&DistrictRisk> {
    let mut ranked: Vec<&DistrictRisk> = risks.iter().collect();
    ranked.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
    ranked.truncate(n);
    ranked
}

/// Severity classification of one known district, for map fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictTier {
    /// District name.
    pub name: String,
    /// Cached level, if any.
    pub risk_level: Option<u8>,
    /// Severity bucket ([`SeverityTier::NoData`] when uncached).
    pub tier: SeverityTier,
    /// Fill colour for the tier.
    pub color: String,
}

/// Classifies every district in `districts`, in table order.
#[must_use]
pub fn district_tiers(districts: &[District], risks: &[DistrictRisk]) -> Vec<DistrictTier> {
    districts
        .iter()
        .map(|district| {
            let risk_level = risks
                .iter()
                .find(|r| r.name == district.name)
                .map(|r| r.risk_level.value());
            let tier = SeverityTier::from_risk_level(risk_level);
            DistrictTier {
                name: district.name.clone(),
                risk_level,
                tier,
                color: tier.color().to_string(),
            }
        })
        .collect()
}

/// A dashboard list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRisk {
    /// The underlying record.
    #[serde(flatten)]
    pub risk: DistrictRisk,
    /// Severity bucket.
    pub tier: SeverityTier,
    /// Badge style.
    pub badge: BadgeVariant,
}

impl RankedRisk {
    fn from_risk(risk: &DistrictRisk) -> Self {
        let level = risk.risk_level.value();
        Self {
            risk: risk.clone(),
            tier: SeverityTier::from_risk_level(Some(level)),
            badge: BadgeVariant::from_risk_level(level),
        }
    }
}

/// Everything the dashboard renders from one refresh result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The single most at-risk district.
    pub highest: Option<RankedRisk>,
    /// Highest-risk districts, most severe first.
    pub top: Vec<RankedRisk>,
    /// Map classification for every known district.
    pub tiers: Vec<DistrictTier>,
}

impl DashboardSummary {
    /// Builds the summary with a top list of `n` entries.
    #[must_use]
    pub fn build(districts: &[District], risks: &[DistrictRisk], n: usize) -> Self {
        Self {
            highest: highest_risk(risks).map(RankedRisk::from_risk),
            top: top_n(risks, n)
                .into_iter()
                .map(RankedRisk::from_risk)
                .collect(),
            tiers: district_tiers(districts, risks),
        }
    }
}
