//! Case statistics from officer health reports.

use std::collections::HashMap;

use dengue_watch_district_models::District;
use dengue_watch_district_models::health::{DistrictCaseSummary, DistrictHealthReport};
use serde::{Deserialize, Serialize};

/// Totals per district, in district-table order. Districts without reports
/// are omitted, as are reports for names outside the table.
#[must_use]
pub fn summarize_cases(
    districts: &[District],
    reports: &[DistrictHealthReport],
) -> Vec<DistrictCaseSummary> {
    let mut by_district: HashMap<&str, DistrictCaseSummary> = HashMap::new();

    for report in reports {
        let summary = by_district
            .entry(report.district_name.as_str())
            .or_insert_with(|| DistrictCaseSummary {
                district_name: report.district_name.clone(),
                total_cases: 0,
                total_deaths: 0,
                report_count: 0,
                latest_report_date: None,
            });
        summary.total_cases += u64::from(report.cases);
        summary.total_deaths += u64::from(report.deaths);
        summary.report_count += 1;
        summary.latest_report_date = summary
            .latest_report_date
            .max(Some(report.reported_date));
    }

    districts
        .iter()
        .filter_map(|district| by_district.remove(district.name.as_str()))
        .collect()
}

/// Country-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalTotals {
    /// Sum of cases.
    pub total_cases: u64,
    /// Sum of deaths.
    pub total_deaths: u64,
    /// Districts with at least one report.
    pub districts_reporting: u64,
}

/// Folds per-district summaries into national totals.
#[must_use]
pub fn national_totals(summaries: &[DistrictCaseSummary]) -> NationalTotals {
    summaries
        .iter()
        .fold(NationalTotals::default(), |mut totals, summary| {
            totals.total_cases += summary.total_cases;
            totals.total_deaths += summary.total_deaths;
            totals.districts_reporting += 1;
            totals
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use dengue_watch_district_models::sri_lanka_districts;

    fn report(district: &str, day: u32, cases: u32, deaths: u32) -> DistrictHealthReport {
        DistrictHealthReport {
            id: format!("{district}-{day}"),
            district_name: district.to_string(),
            reported_date: NaiveDate::from_ymd_opt(2026, 9, day).unwrap(),
            cases,
            deaths,
            reported_by_id: "officer".to_string(),
            reported_at: Utc::now(),
        }
    }

    #[test]
    fn sums_per_district_in_table_order() {
        let reports = [
            report("Kandy", 3, 4, 0),
            report("Colombo", 1, 10, 1),
            report("Colombo", 7, 6, 0),
            report("Nowhere", 2, 99, 9),
        ];

        let summaries = summarize_cases(&sri_lanka_districts(), &reports);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].district_name, "Colombo");
        assert_eq!(summaries[0].total_cases, 16);
        assert_eq!(summaries[0].total_deaths, 1);
        assert_eq!(summaries[0].report_count, 2);
        assert_eq!(
            summaries[0].latest_report_date,
            NaiveDate::from_ymd_opt(2026, 9, 7)
        );
        assert_eq!(summaries[1].district_name, "Kandy");
    }

    #[test]
    fn no_reports_means_no_summaries() {
        assert!(summarize_cases(&sri_lanka_districts(), &[]).is_empty());
        assert_eq!(national_totals(&[]), NationalTotals::default());
    }

    #[test]
    fn national_totals_add_up() {
        let reports = [
            report("Galle", 1, 5, 0),
            report("Matara", 2, 7, 2),
            report("Galle", 3, 1, 0),
        ];
        let totals = national_totals(&summarize_cases(&sri_lanka_districts(), &reports));

        assert_eq!(
            totals,
            NationalTotals {
                total_cases: 13,
                total_deaths: 2,
                districts_reporting: 2,
            }
        );
    }
}
