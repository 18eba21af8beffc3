//! In-memory [`DistrictRiskStore`], used when no database path is
//! configured and in tests.

use std::collections::BTreeMap;

use dengue_watch_district_models::{DistrictRisk, DistrictRiskFields};
use tokio::sync::RwLock;

use crate::{DbError, DistrictRiskStore};

/// Map-backed risk cache with the same last-write-wins rule as the
/// `SQLite` store.
#[derive(Default)]
pub struct MemoryRiskStore {
    records: RwLock<BTreeMap<String, DistrictRisk>>,
}

impl MemoryRiskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = DistrictRisk>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|risk| (risk.name.clone(), risk))
                    .collect(),
            ),
        }
    }
}

#[async_trait::async_trait]
impl DistrictRiskStore for MemoryRiskStore {
    async fn get_all(&self) -> Vec<DistrictRisk> {
        self.records.read().await.values().cloned().collect()
    }

    async fn get_one(&self, name: &str) -> Option<DistrictRisk> {
        self.records.read().await.get(name).cloned()
    }

    async fn upsert(&self, name: &str, fields: DistrictRiskFields) -> Result<(), DbError> {
        let mut records = self.records.write().await;

        if let Some(existing) = records.get(name)
            && existing.updated_at >= fields.updated_at
        {
            log::debug!("Ignored stale write for district {name}");
            return Ok(());
        }

        records.insert(name.to_string(), fields.into_record(name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use dengue_watch_district_models::RiskLevel;

    fn fields(level: i64, updated_at: DateTime<Utc>) -> DistrictRiskFields {
        DistrictRiskFields {
            risk_level: RiskLevel::new(level).unwrap(),
            assessment: "test".to_string(),
            temperature: 27.0,
            humidity: 70.0,
            rainfall: 0.0,
            updated_at,
        }
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let store = MemoryRiskStore::new();
        let now = Utc::now();

        store.upsert("Matara", fields(4, now)).await.unwrap();

        let risk = store.get_one("Matara").await.unwrap();
        assert_eq!(risk.name, "Matara");
        assert_eq!(risk.risk_level.value(), 4);
        assert!(store.get_one("Badulla").await.is_none());
    }

    #[tokio::test]
    async fn keeps_newest_write() {
        let store = MemoryRiskStore::new();
        let t0 = Utc::now();

        store.upsert("Matara", fields(4, t0)).await.unwrap();
        store
            .upsert("Matara", fields(1, t0 - Duration::seconds(1)))
            .await
            .unwrap();
        assert_eq!(store.get_one("Matara").await.unwrap().risk_level.value(), 4);

        store
            .upsert("Matara", fields(7, t0 + Duration::seconds(1)))
            .await
            .unwrap();
        assert_eq!(store.get_one("Matara").await.unwrap().risk_level.value(), 7);
    }

    #[tokio::test]
    async fn seeded_records_are_listed() {
        let now = Utc::now();
        let store = MemoryRiskStore::with_records([
            fields(2, now).into_record("Ampara"),
            fields(5, now).into_record("Puttalam"),
        ]);

        let names: Vec<_> = store.get_all().await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Ampara", "Puttalam"]);
    }
}
