//! Per-district risk cache.
//!
//! Reads never fail from the caller's point of view: a failed read is
//! logged and reported as "nothing cached", which makes the refresh engine
//! recompute. Writes are merge-upserts keyed by district name and only
//! apply when they carry a newer `updated_at` than the stored record, so
//! overlapping refresh cycles settle on the latest computation.

use std::sync::Arc;

use dengue_watch_district_models::{DistrictRisk, DistrictRiskFields, RiskLevel};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, format_timestamp, parse_timestamp};

/// Keyed store of [`DistrictRisk`] records.
#[async_trait::async_trait]
pub trait DistrictRiskStore: Send + Sync {
    /// Returns every cached record. Read failures yield an empty list.
    async fn get_all(&self) -> Vec<DistrictRisk>;

    /// Returns the record for `name`, or `None` when absent or unreadable.
    async fn get_one(&self, name: &str) -> Option<DistrictRisk>;

    /// Merge-writes `fields` under `name`, creating the record if needed.
    ///
    /// A write whose `updated_at` is not newer than the stored record's is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    async fn upsert(&self, name: &str, fields: DistrictRiskFields) -> Result<(), DbError>;
}

/// [`DistrictRiskStore`] backed by the `district_risks` `SQLite` table.
pub struct SqliteRiskStore {
    db: Arc<dyn Database>,
}

impl SqliteRiskStore {
    /// Wraps an open database (see [`crate::open_db`]).
    #[must_use]
    pub const fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    async fn try_get_all(&self) -> Result<Vec<DistrictRisk>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT name, risk_level, assessment, temperature, humidity, rainfall, updated_at
                 FROM district_risks
                 ORDER BY name",
                &[],
            )
            .await?;

        let mut risks = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_risk(row) {
                Ok(risk) => risks.push(risk),
                Err(e) => log::warn!("Skipping unreadable district risk row: {e}"),
            }
        }
        Ok(risks)
    }

    async fn try_get_one(&self, name: &str) -> Result<Option<DistrictRisk>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT name, risk_level, assessment, temperature, humidity, rainfall, updated_at
                 FROM district_risks
                 WHERE name = $1",
                &[DatabaseValue::String(name.to_string())],
            )
            .await?;

        rows.first().map(row_to_risk).transpose()
    }
}

fn row_to_risk(row: &switchy_database::Row) -> Result<DistrictRisk, DbError> {
    let conversion = |column: &str| DbError::Conversion {
        message: format!("missing or invalid column '{column}'"),
    };

    let name: String = row.to_value("name").map_err(|_| conversion("name"))?;
    let level: i64 = row
        .to_value("risk_level")
        .map_err(|_| conversion("risk_level"))?;
    let updated_at: String = row
        .to_value("updated_at")
        .map_err(|_| conversion("updated_at"))?;

    Ok(DistrictRisk {
        risk_level: RiskLevel::new(level)?,
        assessment: row
            .to_value("assessment")
            .map_err(|_| conversion("assessment"))?,
        temperature: row
            .to_value("temperature")
            .map_err(|_| conversion("temperature"))?,
        humidity: row
            .to_value("humidity")
            .map_err(|_| conversion("humidity"))?,
        rainfall: row
            .to_value("rainfall")
            .map_err(|_| conversion("rainfall"))?,
        updated_at: parse_timestamp(&updated_at)?,
        name,
    })
}

#[async_trait::async_trait]
impl DistrictRiskStore for SqliteRiskStore {
    async fn get_all(&self) -> Vec<DistrictRisk> {
        match self.try_get_all().await {
            Ok(risks) => risks,
            Err(e) => {
                log::error!("Error fetching district risks: {e}");
                Vec::new()
            }
        }
    }

    async fn get_one(&self, name: &str) -> Option<DistrictRisk> {
        match self.try_get_one(name).await {
            Ok(risk) => risk,
            Err(e) => {
                log::error!("Error fetching district risk for {name}: {e}");
                None
            }
        }
    }

    async fn upsert(&self, name: &str, fields: DistrictRiskFields) -> Result<(), DbError> {
        let applied = self
            .db
            .exec_raw_params(
                "INSERT INTO district_risks
                    (name, risk_level, assessment, temperature, humidity, rainfall, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (name) DO UPDATE SET
                    risk_level = excluded.risk_level,
                    assessment = excluded.assessment,
                    temperature = excluded.temperature,
                    humidity = excluded.humidity,
                    rainfall = excluded.rainfall,
                    updated_at = excluded.updated_at
                 WHERE excluded.updated_at > district_risks.updated_at",
                &[
                    DatabaseValue::String(name.to_string()),
                    DatabaseValue::Int32(i32::from(fields.risk_level.value())),
                    DatabaseValue::String(fields.assessment),
                    DatabaseValue::Real64(fields.temperature),
                    DatabaseValue::Real64(fields.humidity),
                    DatabaseValue::Real64(fields.rainfall),
                    DatabaseValue::String(format_timestamp(fields.updated_at)),
                ],
            )
            .await?;

        if applied == 0 {
            log::debug!("Ignored stale write for district {name}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_db;
    use crate::test_support::temp_db_path;
    use chrono::{DateTime, Duration, Utc};

    fn fields(level: i64, updated_at: DateTime<Utc>) -> DistrictRiskFields {
        DistrictRiskFields {
            risk_level: RiskLevel::new(level).unwrap(),
            assessment: format!("level {level}"),
            temperature: 29.5,
            humidity: 80.0,
            rainfall: 1.2,
            updated_at,
        }
    }

    async fn store() -> SqliteRiskStore {
        SqliteRiskStore::new(open_db(&temp_db_path()).await.unwrap())
    }

    #[tokio::test]
    async fn upsert_creates_then_reads_back() {
        let store = store().await;
        let now: DateTime<Utc> = "2026-10-15T08:00:00Z".parse().unwrap();

        store.upsert("Colombo", fields(8, now)).await.unwrap();

        let risk = store.get_one("Colombo").await.unwrap();
        assert_eq!(risk.risk_level.value(), 8);
        assert_eq!(risk.updated_at, now);
        assert!((risk.rainfall - 1.2).abs() < 1e-9);
        assert_eq!(store.get_all().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_district_is_absent() {
        assert!(store().await.get_one("Jaffna").await.is_none());
    }

    #[tokio::test]
    async fn newer_write_replaces_record() {
        let store = store().await;
        let t0: DateTime<Utc> = "2026-10-15T08:00:00Z".parse().unwrap();

        store.upsert("Galle", fields(3, t0)).await.unwrap();
        store
            .upsert("Galle", fields(9, t0 + Duration::hours(2)))
            .await
            .unwrap();

        let risk = store.get_one("Galle").await.unwrap();
        assert_eq!(risk.risk_level.value(), 9);
        assert_eq!(risk.updated_at, t0 + Duration::hours(2));
    }

    #[tokio::test]
    async fn older_write_never_downgrades_timestamp() {
        let store = store().await;
        let t0: DateTime<Utc> = "2026-10-15T08:00:00Z".parse().unwrap();

        store.upsert("Kandy", fields(6, t0)).await.unwrap();
        store
            .upsert("Kandy", fields(2, t0 - Duration::minutes(5)))
            .await
            .unwrap();

        let risk = store.get_one("Kandy").await.unwrap();
        assert_eq!(risk.risk_level.value(), 6);
        assert_eq!(risk.updated_at, t0);
    }
}
