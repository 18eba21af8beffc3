//! Severity tiers and badge styling derived from a numeric risk level.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Categorical severity bucket used for map fills and the legend.
///
/// Each bucket's upper edge is inclusive: a level of exactly 8 is
/// [`SeverityTier::High`], not [`SeverityTier::VeryHigh`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SeverityTier {
    /// No cached assessment for the district.
    NoData,
    /// Levels 1-2.
    Low,
    /// Levels 3-5.
    Moderate,
    /// Levels 6-8.
    High,
    /// Levels 9-10.
    VeryHigh,
}

impl SeverityTier {
    /// Every tier from most to least severe, with `NoData` last.
    pub const ALL: &[Self] = &[
        Self::VeryHigh,
        Self::High,
        Self::Moderate,
        Self::Low,
        Self::NoData,
    ];

    /// Buckets a risk level. `None` means the district has no data.
    #[must_use]
    pub const fn from_risk_level(level: Option<u8>) -> Self {
        match level {
            None => Self::NoData,
            Some(l) if l > 8 => Self::VeryHigh,
            Some(l) if l > 5 => Self::High,
            Some(l) if l > 2 => Self::Moderate,
            Some(_) => Self::Low,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoData => "no data",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very high",
        }
    }

    /// Map fill colour as a hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::NoData => "#A1A1AA",
            Self::Low => "#10B981",
            Self::Moderate => "#3B82F6",
            Self::High => "#F59E0B",
            Self::VeryHigh => "#EF4444",
        }
    }

    /// Inclusive level range covered by this tier, or `None` for `NoData`.
    #[must_use]
    pub const fn level_range(self) -> Option<(u8, u8)> {
        match self {
            Self::NoData => None,
            Self::Low => Some((1, 2)),
            Self::Moderate => Some((3, 5)),
            Self::High => Some((6, 8)),
            Self::VeryHigh => Some((9, 10)),
        }
    }
}

/// Badge style for a district popup or sample list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BadgeVariant {
    /// Levels above 8.
    Destructive,
    /// Levels 6-8.
    Secondary,
    /// Everything else.
    Default,
}

impl BadgeVariant {
    /// Picks the badge style for a level.
    #[must_use]
    pub const fn from_risk_level(level: u8) -> Self {
        if level > 8 {
            Self::Destructive
        } else if level > 5 {
            Self::Secondary
        } else {
            Self::Default
        }
    }
}

/// One row of the map legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// The tier this row describes.
    pub tier: SeverityTier,
    /// Display label.
    pub label: String,
    /// Fill colour.
    pub color: String,
    /// Range text such as `"6-8"`, or `"n/a"` for no data.
    pub range: String,
}

/// Builds the legend rows, most severe first.
#[must_use]
pub fn legend() -> Vec<LegendEntry> {
    SeverityTier::ALL
        .iter()
        .map(|&tier| LegendEntry {
            tier,
            label: tier.label().to_string(),
            color: tier.color().to_string(),
            range: tier
                .level_range()
                .map_or_else(|| "n/a".to_string(), |(lo, hi)| format!("{lo}-{hi}")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(SeverityTier::from_risk_level(Some(8)), SeverityTier::High);
        assert_eq!(SeverityTier::from_risk_level(Some(9)), SeverityTier::VeryHigh);
        assert_eq!(SeverityTier::from_risk_level(Some(2)), SeverityTier::Low);
        assert_eq!(SeverityTier::from_risk_level(Some(3)), SeverityTier::Moderate);
        assert_eq!(SeverityTier::from_risk_level(Some(5)), SeverityTier::Moderate);
        assert_eq!(SeverityTier::from_risk_level(Some(6)), SeverityTier::High);
        assert_eq!(SeverityTier::from_risk_level(None), SeverityTier::NoData);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(SeverityTier::from_risk_level(Some(8)).label(), "high");
        assert_eq!(SeverityTier::from_risk_level(Some(10)).label(), "very high");
        assert_eq!(SeverityTier::from_risk_level(None).label(), "no data");
    }

    #[test]
    fn tier_ranges_match_bucketing() {
        for level in 1..=10u8 {
            let tier = SeverityTier::from_risk_level(Some(level));
            let (lo, hi) = tier.level_range().unwrap();
            assert!((lo..=hi).contains(&level), "{level} not in {tier:?}");
        }
    }

    #[test]
    fn badge_variants() {
        assert_eq!(BadgeVariant::from_risk_level(9), BadgeVariant::Destructive);
        assert_eq!(BadgeVariant::from_risk_level(8), BadgeVariant::Secondary);
        assert_eq!(BadgeVariant::from_risk_level(5), BadgeVariant::Default);
    }

    #[test]
    fn legend_lists_every_tier() {
        let rows = legend();
        assert_eq!(rows.len(), SeverityTier::ALL.len());
        assert_eq!(rows[0].range, "9-10");
        assert_eq!(rows[4].range, "n/a");
    }
}
