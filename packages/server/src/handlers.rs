//! HTTP handler functions for the dengue watch API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use dengue_watch_database::DbError;
use dengue_watch_district_models::health::NewHealthReport;
use dengue_watch_district_models::{District, find_district, legend as severity_legend};
use dengue_watch_risk::{
    DashboardSummary, ProgressCallback, RefreshOutcome, national_totals, null_progress,
    summarize_cases,
};
use dengue_watch_server_models::{
    ApiCaseSummary, ApiConfig, ApiDistrictRisks, ApiHealth, DistrictRisksQuery,
    HealthReportsQuery, RefreshEvent,
};
use tokio::sync::mpsc;

use crate::AppState;
use crate::events::{ChannelProgress, completion_event, encode_event};

/// Default length of the dashboard's top list.
const DEFAULT_TOP: usize = 5;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/config`
///
/// Tells the frontend whether live assessment is available and which map
/// tile key to use.
pub async fn config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiConfig {
        weather_configured: state.orchestrator.is_configured(),
        map_tile_key: state.map_tile_key.clone(),
    })
}

/// `GET /api/districts`
pub async fn districts(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.districts.as_slice())
}

/// `GET /api/legend`
pub async fn legend() -> HttpResponse {
    HttpResponse::Ok().json(severity_legend())
}

/// `GET /api/district-risks`
///
/// Runs a refresh cycle and returns every computed district with the
/// dashboard summary.
pub async fn district_risks(
    state: web::Data<AppState>,
    query: web::Query<DistrictRisksQuery>,
) -> HttpResponse {
    let outcome = state
        .orchestrator
        .refresh(&state.districts, &null_progress())
        .await;

    HttpResponse::Ok().json(risks_payload(
        &state.districts,
        outcome,
        query.top.unwrap_or(DEFAULT_TOP),
    ))
}

/// `GET /api/district-risks/stream`
///
/// Runs a refresh cycle and streams `progress` events as districts
/// resolve, then a single `complete` event carrying the same payload as
/// [`district_risks`], or an `error` event if the refresh task died.
pub async fn district_risks_stream(
    state: web::Data<AppState>,
    query: web::Query<DistrictRisksQuery>,
) -> HttpResponse {
    let (tx, mut rx) = mpsc::unbounded_channel::<RefreshEvent>();
    let top = query.top.unwrap_or(DEFAULT_TOP);

    let progress: Arc<dyn ProgressCallback> = Arc::new(ChannelProgress::new(tx.clone()));
    let refresh = actix_web::rt::spawn(async move {
        let outcome = state.orchestrator.refresh(&state.districts, &progress).await;
        risks_payload(&state.districts, outcome, top)
    });

    actix_web::rt::spawn(async move {
        let _ = tx.send(completion_event(refresh.await));
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            if let Some(frame) = encode_event(&event) {
                yield Ok::<_, actix_web::Error>(frame);
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// `GET /api/district-risks/{name}`
///
/// Returns the cached record without refreshing.
pub async fn district_risk(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let name = path.into_inner();

    if find_district(&state.districts, &name).is_none() {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Unknown district: {name}")
        }));
    }

    match state.orchestrator.store().get_one(&name).await {
        Some(risk) => HttpResponse::Ok().json(risk),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("No risk assessment cached for {name}")
        })),
    }
}

/// `POST /api/health-reports`
pub async fn create_health_report(
    state: web::Data<AppState>,
    body: web::Json<NewHealthReport>,
) -> HttpResponse {
    match state
        .health_reports
        .insert(&body.into_inner(), &state.districts)
        .await
    {
        Ok(report) => HttpResponse::Created().json(report),
        Err(DbError::Model(e)) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        })),
        Err(e) => {
            log::error!("Failed to store health report: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to store health report"
            }))
        }
    }
}

/// `GET /api/health-reports`
pub async fn health_reports(
    state: web::Data<AppState>,
    query: web::Query<HealthReportsQuery>,
) -> HttpResponse {
    match state.health_reports.list(query.district.as_deref()).await {
        Ok(reports) => HttpResponse::Ok().json(reports),
        Err(e) => {
            log::error!("Failed to query health reports: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query health reports"
            }))
        }
    }
}

/// `GET /api/health-reports/summary`
///
/// Case and death totals per district plus national totals.
pub async fn health_reports_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.health_reports.list(None).await {
        Ok(reports) => {
            let districts = summarize_cases(&state.districts, &reports);
            let national = national_totals(&districts);
            HttpResponse::Ok().json(ApiCaseSummary {
                districts,
                national,
            })
        }
        Err(e) => {
            log::error!("Failed to summarize health reports: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to summarize health reports"
            }))
        }
    }
}

/// Builds the API payload for a finished refresh. Pending cache writes are
/// left to run on their own.
fn risks_payload(districts: &[District], outcome: RefreshOutcome, top: usize) -> ApiDistrictRisks {
    let summary = DashboardSummary::build(districts, &outcome.risks, top);
    ApiDistrictRisks::new(outcome.status, outcome.risks, summary)
}
