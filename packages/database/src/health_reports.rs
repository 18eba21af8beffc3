//! Officer-submitted dengue case reports.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dengue_watch_district_models::District;
use dengue_watch_district_models::health::{DistrictHealthReport, NewHealthReport};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, format_timestamp, parse_timestamp};

/// Append-only store for [`DistrictHealthReport`]s.
pub struct HealthReportStore {
    db: Arc<dyn Database>,
}

impl HealthReportStore {
    /// Wraps an open database (see [`crate::open_db`]).
    #[must_use]
    pub const fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Validates and stores a report, assigning its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Model`] if the report fails validation, or
    /// [`DbError::Database`] if the insert fails.
    pub async fn insert(
        &self,
        report: &NewHealthReport,
        districts: &[District],
    ) -> Result<DistrictHealthReport, DbError> {
        report.validate(districts)?;

        let stored = DistrictHealthReport {
            id: uuid::Uuid::new_v4().to_string(),
            district_name: report.district_name.clone(),
            reported_date: report.reported_date,
            cases: report.cases,
            deaths: report.deaths,
            reported_by_id: report.reported_by_id.trim().to_string(),
            reported_at: Utc::now(),
        };

        self.db
            .exec_raw_params(
                "INSERT INTO health_reports
                    (id, district_name, reported_date, cases, deaths, reported_by_id, reported_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    DatabaseValue::String(stored.id.clone()),
                    DatabaseValue::String(stored.district_name.clone()),
                    DatabaseValue::String(stored.reported_date.to_string()),
                    DatabaseValue::Int64(i64::from(stored.cases)),
                    DatabaseValue::Int64(i64::from(stored.deaths)),
                    DatabaseValue::String(stored.reported_by_id.clone()),
                    DatabaseValue::String(format_timestamp(stored.reported_at)),
                ],
            )
            .await?;

        log::info!(
            "Stored health report {} for {} ({} cases, {} deaths)",
            stored.id,
            stored.district_name,
            stored.cases,
            stored.deaths
        );

        Ok(stored)
    }

    /// Lists reports newest first, optionally for a single district.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row cannot be decoded.
    pub async fn list(&self, district: Option<&str>) -> Result<Vec<DistrictHealthReport>, DbError> {
        let rows = match district {
            Some(name) => {
                self.db
                    .query_raw_params(
                        "SELECT id, district_name, reported_date, cases, deaths, reported_by_id, reported_at
                         FROM health_reports
                         WHERE district_name = $1
                         ORDER BY reported_date DESC, reported_at DESC",
                        &[DatabaseValue::String(name.to_string())],
                    )
                    .await?
            }
            None => {
                self.db
                    .query_raw_params(
                        "SELECT id, district_name, reported_date, cases, deaths, reported_by_id, reported_at
                         FROM health_reports
                         ORDER BY reported_date DESC, reported_at DESC",
                        &[],
                    )
                    .await?
            }
        };

        rows.iter().map(row_to_report).collect()
    }
}

fn row_to_report(row: &switchy_database::Row) -> Result<DistrictHealthReport, DbError> {
    let conversion = |column: &str| DbError::Conversion {
        message: format!("missing or invalid column '{column}'"),
    };
    let count = |column: &str| -> Result<u32, DbError> {
        let raw: i64 = row.to_value(column).map_err(|_| conversion(column))?;
        u32::try_from(raw).map_err(|_| conversion(column))
    };

    let reported_date: String = row
        .to_value("reported_date")
        .map_err(|_| conversion("reported_date"))?;
    let reported_at: String = row
        .to_value("reported_at")
        .map_err(|_| conversion("reported_at"))?;

    Ok(DistrictHealthReport {
        id: row.to_value("id").map_err(|_| conversion("id"))?,
        district_name: row
            .to_value("district_name")
            .map_err(|_| conversion("district_name"))?,
        reported_date: reported_date
            .parse::<NaiveDate>()
            .map_err(|_| conversion("reported_date"))?,
        cases: count("cases")?,
        deaths: count("deaths")?,
        reported_by_id: row
            .to_value("reported_by_id")
            .map_err(|_| conversion("reported_by_id"))?,
        reported_at: parse_timestamp(&reported_at)?,
    })
}
