#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District risk refresh engine.
//!
//! Decides which districts need their breeding risk recomputed
//! ([`staleness`]), fans recomputation out across weather and inference
//! providers ([`orchestrator`]), and reduces the resulting records into
//! dashboard views ([`aggregate`], [`cases`]).

pub mod aggregate;
pub mod cases;
pub mod orchestrator;
pub mod progress;
pub mod staleness;

use dengue_watch_ai::AiError;
use dengue_watch_weather::WeatherError;
use thiserror::Error;

pub use aggregate::{
    DashboardSummary, DistrictTier, RankedRisk, district_tiers, highest_risk, top_n,
};
pub use cases::{NationalTotals, national_totals, summarize_cases};
pub use orchestrator::{RefreshOutcome, RefreshStatus, RiskOrchestrator};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use staleness::{STALE_THRESHOLD_HOURS, is_stale};

/// Why a single district could not be recomputed.
#[derive(Debug, Error)]
pub enum RiskError {
    /// The weather lookup failed.
    #[error("weather lookup failed: {0}")]
    Weather(#[from] WeatherError),

    /// The risk inference call failed or returned unusable output.
    #[error("risk inference failed: {0}")]
    Inference(#[from] AiError),
}
