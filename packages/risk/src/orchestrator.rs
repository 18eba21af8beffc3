//! Refresh cycle for the district risk cache.
//!
//! A cycle takes a snapshot of cached records, reuses every fresh one, and
//! recomputes stale districts concurrently: weather lookup, then risk
//! inference on the reading. New records are written back to the store by
//! detached tasks so the caller never waits on persistence. A district that
//! fails keeps its previous record (if any) and is retried on the next
//! cycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dengue_watch_ai::providers::create_provider_from_env;
use dengue_watch_ai::{LlmRiskAssessor, RiskInference};
use dengue_watch_database::DistrictRiskStore;
use dengue_watch_district_models::{District, DistrictRisk};
use dengue_watch_weather::{API_KEY_ENV, OpenWeatherClient, WeatherProvider};
use futures::stream::{self, StreamExt as _};
use tokio::task::JoinHandle;

use crate::RiskError;
use crate::progress::ProgressCallback;
use crate::staleness::is_stale;

/// Default number of districts recomputed at once.
pub const DEFAULT_CONCURRENCY: usize = 25;

/// How a refresh cycle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Stale districts were recomputed (or attempted).
    Refreshed {
        /// Fresh records served from the cache.
        reused: usize,
        /// Districts recomputed successfully.
        recomputed: usize,
        /// Districts whose recomputation failed.
        failed: usize,
    },
    /// Provider credentials are missing; only cached records were served.
    NotConfigured,
}

/// Result of [`RiskOrchestrator::refresh_all`].
#[derive(Debug)]
pub struct RefreshOutcome {
    /// One record per known district that has ever been computed, in
    /// district-table order.
    pub risks: Vec<DistrictRisk>,
    /// Summary of the cycle.
    pub status: RefreshStatus,
    /// Cache writes spawned for recomputed districts. Already running;
    /// joining is optional.
    pub pending_writes: Vec<JoinHandle<()>>,
}

impl RefreshOutcome {
    /// Returns `true` if the cycle ran without provider credentials.
    #[must_use]
    pub const fn is_not_configured(&self) -> bool {
        matches!(self.status, RefreshStatus::NotConfigured)
    }
}

/// Coordinates staleness checks, provider calls, and cache writes.
pub struct RiskOrchestrator {
    weather: Option<Arc<dyn WeatherProvider>>,
    inference: Option<Arc<dyn RiskInference>>,
    store: Arc<dyn DistrictRiskStore>,
    concurrency: usize,
}

impl RiskOrchestrator {
    /// Creates an orchestrator. A `None` provider puts every cycle in
    /// cached-only mode.
    #[must_use]
    pub fn new(
        weather: Option<Arc<dyn WeatherProvider>>,
        inference: Option<Arc<dyn RiskInference>>,
        store: Arc<dyn DistrictRiskStore>,
    ) -> Self {
        Self {
            weather,
            inference,
            store,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Builds the providers from environment credentials. A provider whose
    /// credentials are missing is left out, and `RISK_CONCURRENCY` sets the
    /// fan-out width.
    #[must_use]
    pub fn from_env(store: Arc<dyn DistrictRiskStore>) -> Self {
        Self::from_env_with_weather_key(store, std::env::var(API_KEY_ENV).ok())
    }

    /// Like [`Self::from_env`], but with the weather key supplied by the
    /// caller (for example, entered at an interactive prompt).
    #[must_use]
    pub fn from_env_with_weather_key(
        store: Arc<dyn DistrictRiskStore>,
        weather_key: Option<String>,
    ) -> Self {
        let weather = OpenWeatherClient::from_key(weather_key)
            .map(|client| Arc::new(client) as Arc<dyn WeatherProvider>);

        let inference = match create_provider_from_env() {
            Ok(provider) => {
                log::info!("Risk inference provider: {}", provider.name());
                Some(Arc::new(LlmRiskAssessor::new(provider)) as Arc<dyn RiskInference>)
            }
            Err(e) => {
                log::warn!("Risk inference disabled: {e}");
                None
            }
        };

        Self::new(weather, inference, store).with_concurrency(concurrency_from_env())
    }

    /// Overrides the number of districts recomputed at once (minimum 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns `true` when both providers are available.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.weather.is_some() && self.inference.is_some()
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn DistrictRiskStore> {
        &self.store
    }

    /// Reads the cache snapshot from the store and runs a cycle.
    pub async fn refresh(
        &self,
        districts: &[District],
        progress: &Arc<dyn ProgressCallback>,
    ) -> RefreshOutcome {
        let cached = self.store.get_all().await;
        self.refresh_all(districts, cached, progress).await
    }

    /// Runs a cycle against `cached` using the current time.
    pub async fn refresh_all(
        &self,
        districts: &[District],
        cached: Vec<DistrictRisk>,
        progress: &Arc<dyn ProgressCallback>,
    ) -> RefreshOutcome {
        self.refresh_all_at(districts, cached, progress, Utc::now())
            .await
    }

    /// Runs a cycle against `cached`, treating `now` as the current time
    /// for staleness checks and new record timestamps.
    pub async fn refresh_all_at(
        &self,
        districts: &[District],
        cached: Vec<DistrictRisk>,
        progress: &Arc<dyn ProgressCallback>,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        let total = districts.len() as u64;
        progress.set_total(total);

        let mut by_name: HashMap<String, DistrictRisk> = cached
            .into_iter()
            .map(|risk| (risk.name.clone(), risk))
            .collect();

        let (Some(weather), Some(inference)) = (&self.weather, &self.inference) else {
            log::warn!(
                "Risk providers not configured (weather: {}, inference: {}); serving cached data only",
                self.weather.is_some(),
                self.inference.is_some()
            );
            progress.set_position(total);
            progress.finish("Serving cached data".to_string());
            return RefreshOutcome {
                risks: in_table_order(districts, by_name),
                status: RefreshStatus::NotConfigured,
                pending_writes: Vec::new(),
            };
        };

        let mut stale = Vec::new();
        for district in districts {
            if is_stale(by_name.get(&district.name), now) {
                stale.push(district);
            } else {
                progress.inc(1);
            }
        }

        let reused = districts.len() - stale.len();
        log::info!(
            "Refreshing {} stale districts ({reused} fresh, concurrency={})",
            stale.len(),
            self.concurrency
        );
        progress.set_message(format!("Assessing {} districts", stale.len()));

        let results: Vec<_> = stream::iter(stale.into_iter().map(|district| async move {
            let result = assess_district(&**weather, &**inference, district, now).await;
            progress.inc(1);
            (district, result)
        }))
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let mut recomputed = 0;
        let mut failed = 0;
        let mut pending_writes = Vec::new();

        for (district, result) in results {
            match result {
                Ok(risk) => {
                    recomputed += 1;
                    pending_writes.push(self.spawn_upsert(&risk));
                    by_name.insert(risk.name.clone(), risk);
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("Failed to refresh risk for {}: {e}", district.name);
                }
            }
        }

        progress.finish(format!(
            "{recomputed} recomputed, {reused} cached, {failed} failed"
        ));

        RefreshOutcome {
            risks: in_table_order(districts, by_name),
            status: RefreshStatus::Refreshed {
                reused,
                recomputed,
                failed,
            },
            pending_writes,
        }
    }

    fn spawn_upsert(&self, risk: &DistrictRisk) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let name = risk.name.clone();
        let fields = risk.fields();

        tokio::spawn(async move {
            if let Err(e) = store.upsert(&name, fields).await {
                log::error!("Failed to cache risk for {name}: {e}");
            }
        })
    }
}

/// Fetches weather for one district and assesses it.
async fn assess_district(
    weather: &dyn WeatherProvider,
    inference: &dyn RiskInference,
    district: &District,
    now: DateTime<Utc>,
) -> Result<DistrictRisk, RiskError> {
    let reading = weather.fetch_weather(district.lat, district.lng).await?;
    let assessment = inference.assess_risk(&reading).await?;

    log::debug!(
        "{}: {} ({:.1}°C, {:.0}%, {:.1} mm)",
        district.name,
        assessment.risk_level,
        reading.temperature,
        reading.humidity,
        reading.rainfall
    );

    Ok(DistrictRisk::from_parts(
        district.name.clone(),
        reading,
        assessment,
        now,
    ))
}

/// Picks one record per known district in table order. Records for names
/// outside the table are dropped.
fn in_table_order(
    districts: &[District],
    mut by_name: HashMap<String, DistrictRisk>,
) -> Vec<DistrictRisk> {
    districts
        .iter()
        .filter_map(|district| by_name.remove(&district.name))
        .collect()
}

/// Reads the concurrency limit from `RISK_CONCURRENCY`, falling back to
/// [`DEFAULT_CONCURRENCY`].
#[must_use]
pub fn concurrency_from_env() -> usize {
    std::env::var("RISK_CONCURRENCY")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_CONCURRENCY)
}
