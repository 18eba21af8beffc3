//! District health report types (officer-submitted dengue case counts).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::districts::{District, find_district};

/// A health officer's case report as submitted, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHealthReport {
    /// District the cases were recorded in.
    pub district_name: String,
    /// Day the cases refer to.
    pub reported_date: NaiveDate,
    /// New confirmed cases.
    pub cases: u32,
    /// Deaths attributed to dengue.
    pub deaths: u32,
    /// Identity of the submitting officer.
    pub reported_by_id: String,
}

impl NewHealthReport {
    /// Checks the report against the district table.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownDistrict`] for a district outside the
    /// table, or [`ModelError::InvalidReport`] when the reporter is missing.
    /// Deaths are not bounded by `cases`: a day's deaths can come from cases
    /// reported earlier.
    pub fn validate(&self, districts: &[District]) -> Result<(), ModelError> {
        if find_district(districts, &self.district_name).is_none() {
            return Err(ModelError::UnknownDistrict {
                name: self.district_name.clone(),
            });
        }
        if self.reported_by_id.trim().is_empty() {
            return Err(ModelError::InvalidReport {
                message: "reporter id is required".to_string(),
            });
        }
        Ok(())
    }
}

/// A stored health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictHealthReport {
    /// Report UUID.
    pub id: String,
    /// District the cases were recorded in.
    pub district_name: String,
    /// Day the cases refer to.
    pub reported_date: NaiveDate,
    /// New confirmed cases.
    pub cases: u32,
    /// Deaths attributed to dengue.
    pub deaths: u32,
    /// Identity of the submitting officer.
    pub reported_by_id: String,
    /// When the report was stored.
    pub reported_at: DateTime<Utc>,
}

/// Per-district totals across all reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictCaseSummary {
    /// District name.
    pub district_name: String,
    /// Sum of reported cases.
    pub total_cases: u64,
    /// Sum of reported deaths.
    pub total_deaths: u64,
    /// Number of reports contributing.
    pub report_count: u64,
    /// Most recent `reported_date` among the reports.
    pub latest_report_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::districts::sri_lanka_districts;

    fn report(district: &str, cases: u32, deaths: u32) -> NewHealthReport {
        NewHealthReport {
            district_name: district.to_string(),
            reported_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            cases,
            deaths,
            reported_by_id: "officer-1".to_string(),
        }
    }

    #[test]
    fn accepts_valid_report() {
        assert!(report("Galle", 12, 1).validate(&sri_lanka_districts()).is_ok());
    }

    #[test]
    fn rejects_unknown_district() {
        assert_eq!(
            report("Atlantis", 1, 0).validate(&sri_lanka_districts()),
            Err(ModelError::UnknownDistrict {
                name: "Atlantis".to_string()
            })
        );
    }

    #[test]
    fn accepts_deaths_without_new_cases() {
        assert!(report("Galle", 0, 1).validate(&sri_lanka_districts()).is_ok());
    }

    #[test]
    fn rejects_blank_reporter() {
        let mut r = report("Galle", 1, 0);
        r.reported_by_id = " ".to_string();
        assert!(r.validate(&sri_lanka_districts()).is_err());
    }
}
