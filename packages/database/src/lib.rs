#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistence for dengue watch.
//!
//! Holds the per-district risk cache behind the [`DistrictRiskStore`]
//! trait (a `SQLite` implementation and an in-memory one) and the health
//! report table. Uses `switchy_database` for all `SQLite` access.

pub mod district_risks;
pub mod health_reports;
pub mod memory;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use dengue_watch_district_models::ModelError;
use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

pub use district_risks::{DistrictRiskStore, SqliteRiskStore};
pub use health_reports::HealthReportStore;
pub use memory::MemoryRiskStore;

/// Default path for the `SQLite` database.
pub const DEFAULT_DB_PATH: &str = "data/dengue_watch.db";

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be converted to a model value.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// Input failed model validation.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<switchy_database::DatabaseError> for DbError {
    fn from(e: switchy_database::DatabaseError) -> Self {
        Self::Database(e.to_string())
    }
}

/// Returns the database path from `DATABASE_PATH`, or [`DEFAULT_DB_PATH`].
#[must_use]
pub fn db_path_from_env() -> String {
    std::env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

/// Opens (or creates) the `SQLite` database and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema creation
/// fails.
pub async fn open_db(path: &Path) -> Result<Arc<dyn Database>, DbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    log::debug!("Opened database at {}", path.display());

    Ok(Arc::from(db))
}

/// Creates all tables if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS district_risks (
            name        TEXT PRIMARY KEY,
            risk_level  INTEGER NOT NULL,
            assessment  TEXT NOT NULL,
            temperature REAL NOT NULL,
            humidity    REAL NOT NULL,
            rainfall    REAL NOT NULL,
            updated_at  TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS health_reports (
            id              TEXT PRIMARY KEY,
            district_name   TEXT NOT NULL,
            reported_date   TEXT NOT NULL,
            cases           INTEGER NOT NULL,
            deaths          INTEGER NOT NULL,
            reported_by_id  TEXT NOT NULL,
            reported_at     TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_health_reports_district
         ON health_reports (district_name, reported_date)",
    )
    .await?;

    Ok(())
}

/// Formats a timestamp with fixed precision so stored values compare
/// correctly as text.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored RFC 3339 timestamp.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("invalid timestamp '{raw}': {e}"),
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// A unique database path under the system temp directory.
    pub fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("dengue_watch_test_{}.db", uuid::Uuid::new_v4()))
    }
}
