//! Freshness rule for cached district risk records.

use chrono::{DateTime, Utc};
use dengue_watch_district_models::DistrictRisk;

/// Age, in whole hours, at which a cached record must be recomputed.
pub const STALE_THRESHOLD_HOURS: i64 = 1;

/// Returns `true` when `record` is missing or at least
/// [`STALE_THRESHOLD_HOURS`] whole hours old at `now`.
///
/// Partial hours are truncated, so a record 59 minutes old is still fresh.
/// Records stamped after `now` count as fresh.
#[must_use]
pub fn is_stale(record: Option<&DistrictRisk>, now: DateTime<Utc>) -> bool {
    record.is_none_or(|r| (now - r.updated_at).num_hours() >= STALE_THRESHOLD_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dengue_watch_district_models::{RiskAssessment, RiskLevel, WeatherReading};

    fn record_at(updated_at: DateTime<Utc>) -> DistrictRisk {
        DistrictRisk::from_parts(
            "Kurunegala",
            WeatherReading {
                temperature: 28.0,
                humidity: 75.0,
                rainfall: 0.0,
            },
            RiskAssessment::new(RiskLevel::new(5).unwrap(), "moderate").unwrap(),
            updated_at,
        )
    }

    fn now() -> DateTime<Utc> {
        "2026-10-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn absent_record_is_stale() {
        assert!(is_stale(None, now()));
    }

    #[test]
    fn just_under_an_hour_is_fresh() {
        let r = record_at(now() - Duration::minutes(59) - Duration::seconds(59));
        assert!(!is_stale(Some(&r), now()));
    }

    #[test]
    fn exactly_an_hour_is_stale() {
        let r = record_at(now() - Duration::minutes(60));
        assert!(is_stale(Some(&r), now()));
    }

    #[test]
    fn just_computed_is_fresh() {
        let r = record_at(now());
        assert!(!is_stale(Some(&r), now()));
    }

    #[test]
    fn future_timestamp_is_fresh() {
        let r = record_at(now() + Duration::hours(3));
        assert!(!is_stale(Some(&r), now()));
    }

    #[test]
    fn day_old_record_is_stale() {
        let r = record_at(now() - Duration::days(1));
        assert!(is_stale(Some(&r), now()));
    }
}
