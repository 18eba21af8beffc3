#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for dengue watch.
//!
//! Serves the district risk dashboard API: refresh-on-read risk listings
//! (plain JSON or a server-sent event stream with per-district progress),
//! cached lookups, the severity legend, and officer health reports. Risk
//! records and health reports live in a single `SQLite` database at
//! `DATABASE_PATH`. The built frontend is served from `app/dist`.

mod events;
mod handlers;
pub mod interactive;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use dengue_watch_database::{
    DbError, HealthReportStore, SqliteRiskStore, db_path_from_env, open_db,
};
use dengue_watch_district_models::{District, sri_lanka_districts};
use dengue_watch_risk::RiskOrchestrator;
use dengue_watch_weather::API_KEY_ENV;

/// Shared application state.
pub struct AppState {
    /// Refresh engine and its risk cache.
    pub orchestrator: Arc<RiskOrchestrator>,
    /// Known districts, in display order.
    pub districts: Arc<Vec<District>>,
    /// Officer health report storage.
    pub health_reports: Arc<HealthReportStore>,
    /// `MapTiler` key passed through to the frontend.
    pub map_tile_key: Option<String>,
}

impl AppState {
    /// Opens the database at `db_path` and builds providers, using
    /// `weather_key` for the weather client and the environment for the
    /// rest.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened.
    pub async fn open(db_path: &Path, weather_key: Option<String>) -> Result<Self, DbError> {
        log::info!("Opening database at {}...", db_path.display());
        let db = open_db(db_path).await?;

        let store = Arc::new(SqliteRiskStore::new(Arc::clone(&db)));
        let orchestrator = RiskOrchestrator::from_env_with_weather_key(store, weather_key);
        if !orchestrator.is_configured() {
            log::warn!("Live risk assessment disabled; the dashboard will serve cached data");
        }

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            districts: Arc::new(sri_lanka_districts()),
            health_reports: Arc::new(HealthReportStore::new(db)),
            map_tile_key: std::env::var("MAPTILER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
        })
    }
}

/// Where to listen and which weather key to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Interface to bind.
    pub bind_addr: String,
    /// TCP port.
    pub port: u16,
    /// `OpenWeatherMap` key, if any.
    pub weather_key: Option<String>,
}

impl ServerSettings {
    /// Reads `BIND_ADDR` (default `127.0.0.1`), `PORT` (default `8080`),
    /// and `OPENWEATHER_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            port: parse_port(std::env::var("PORT").ok().as_deref()),
            weather_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Parses a port, falling back to 8080 when missing or invalid.
fn parse_port(raw: Option<&str>) -> u16 {
    match raw.map(str::trim) {
        None | Some("") => DEFAULT_PORT,
        Some(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Invalid port {value:?}, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/config", web::get().to(handlers::config))
            .route("/districts", web::get().to(handlers::districts))
            .route("/legend", web::get().to(handlers::legend))
            .route("/district-risks", web::get().to(handlers::district_risks))
            .route(
                "/district-risks/stream",
                web::get().to(handlers::district_risks_stream),
            )
            .route(
                "/district-risks/{name}",
                web::get().to(handlers::district_risk),
            )
            .route(
                "/health-reports",
                web::post().to(handlers::create_health_report),
            )
            .route("/health-reports", web::get().to(handlers::health_reports))
            .route(
                "/health-reports/summary",
                web::get().to(handlers::health_reports_summary),
            ),
    );
}

/// Starts the dengue watch API server with its own logger.
///
/// Initializes `pretty_env_logger` from `RUST_LOG` and delegates to
/// [`serve`]. Callers that already installed a logger (the CLI) call
/// [`serve`] directly.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    serve().await
}

/// Runs the HTTP server with settings from the environment.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve() -> std::io::Result<()> {
    serve_with(ServerSettings::from_env()).await
}

/// Builds application state and runs the HTTP server on
/// `settings.bind_addr:settings.port`.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve_with(settings: ServerSettings) -> std::io::Result<()> {
    let ServerSettings {
        bind_addr,
        port,
        weather_key,
    } = settings;

    let state = web::Data::new(
        AppState::open(Path::new(&db_path_from_env()), weather_key)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?,
    );

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use chrono::{Duration, Utc};
    use dengue_watch_database::{DistrictRiskStore, MemoryRiskStore};
    use dengue_watch_district_models::{DistrictRisk, RiskAssessment, RiskLevel, WeatherReading};

    fn temp_db_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dengue_watch_server_test_{}.db", uuid::Uuid::new_v4()))
    }

    async fn state_with(records: Vec<DistrictRisk>) -> web::Data<AppState> {
        let db = open_db(&temp_db_path()).await.unwrap();
        let store: Arc<dyn DistrictRiskStore> = Arc::new(MemoryRiskStore::with_records(records));

        web::Data::new(AppState {
            orchestrator: Arc::new(RiskOrchestrator::new(None, None, store)),
            districts: Arc::new(sri_lanka_districts()),
            health_reports: Arc::new(HealthReportStore::new(db)),
            map_tile_key: None,
        })
    }

    fn stale_colombo() -> DistrictRisk {
        DistrictRisk::from_parts(
            "Colombo",
            WeatherReading {
                temperature: 30.0,
                humidity: 85.0,
                rainfall: 2.0,
            },
            RiskAssessment::new(RiskLevel::new(8).unwrap(), "Warm and wet").unwrap(),
            Utc::now() - Duration::hours(6),
        )
    }

    #[actix_web::test]
    async fn unconfigured_refresh_reports_not_configured() {
        let state = state_with(vec![stale_colombo()]).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get()
            .uri("/api/district-risks")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "notConfigured");
        assert!(body["message"].is_string());
        assert_eq!(body["risks"][0]["name"], "Colombo");
        assert_eq!(body["summary"]["highest"]["tier"], "high");
        assert_eq!(body["summary"]["tiers"].as_array().unwrap().len(), 25);
    }

    #[actix_web::test]
    async fn cached_lookup_distinguishes_unknown_and_missing() {
        let state = state_with(vec![stale_colombo()]).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let found = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/district-risks/Colombo")
                .to_request(),
        )
        .await;
        assert_eq!(found.status(), StatusCode::OK);

        let missing = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/district-risks/Kandy")
                .to_request(),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let unknown = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/district-risks/Atlantis")
                .to_request(),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn health_reports_validate_and_summarize() {
        let state = state_with(Vec::new()).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let created = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/health-reports")
                .set_json(serde_json::json!({
                    "districtName": "Galle",
                    "reportedDate": "2026-10-10",
                    "cases": 12,
                    "deaths": 1,
                    "reportedById": "officer-3"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let rejected = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/health-reports")
                .set_json(serde_json::json!({
                    "districtName": "Atlantis",
                    "reportedDate": "2026-10-10",
                    "cases": 1,
                    "deaths": 0,
                    "reportedById": "officer-3"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let summary: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/health-reports/summary")
                .to_request(),
        )
        .await;
        assert_eq!(summary["national"]["totalCases"], 12);
        assert_eq!(summary["districts"][0]["districtName"], "Galle");
    }

    #[::core::prelude::v1::test]
    fn port_falls_back_to_default() {
        assert_eq!(parse_port(None), 8080);
        assert_eq!(parse_port(Some("")), 8080);
        assert_eq!(parse_port(Some("not-a-port")), 8080);
        assert_eq!(parse_port(Some("70000")), 8080);
        assert_eq!(parse_port(Some(" 9090 ")), 9090);
    }

    #[actix_web::test]
    async fn open_uses_supplied_paths_and_keys() {
        let state = AppState::open(&temp_db_path(), Some("   ".to_string()))
            .await
            .unwrap();

        assert!(!state.orchestrator.is_configured());
        assert_eq!(state.districts.len(), 25);
        assert!(state.health_reports.list(None).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn legend_lists_every_tier() {
        let state = state_with(Vec::new()).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let legend: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/legend").to_request(),
        )
        .await;

        assert_eq!(legend.as_array().unwrap().len(), 5);
        assert_eq!(legend[0]["color"], "#EF4444");
    }
}
