//! Subcommand implementations and terminal formatting.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use dengue_watch_cli_utils::{IndicatifProgress, MultiProgress};
use dengue_watch_database::{
    DistrictRiskStore, HealthReportStore, SqliteRiskStore, db_path_from_env, open_db,
};
use dengue_watch_district_models::health::{
    DistrictCaseSummary, DistrictHealthReport, NewHealthReport,
};
use dengue_watch_district_models::{DistrictRisk, SeverityTier, sri_lanka_districts};
use dengue_watch_risk::{
    DashboardSummary, NationalTotals, RefreshStatus, RiskOrchestrator, national_totals,
    summarize_cases,
};
use dengue_watch_server_models::{ApiDistrictRisks, NOT_CONFIGURED_MESSAGE};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Runs a refresh cycle with a progress bar and prints the results.
pub async fn refresh(multi: &MultiProgress, top: usize, json: bool) -> CliResult {
    let db = open_db(Path::new(&db_path_from_env())).await?;
    let store: Arc<dyn DistrictRiskStore> = Arc::new(SqliteRiskStore::new(db));
    let orchestrator = RiskOrchestrator::from_env(store);
    let districts = sri_lanka_districts();

    let progress = IndicatifProgress::districts_bar(multi, "Refreshing district risks");
    let outcome = orchestrator.refresh(&districts, &progress).await;

    // The process exits after printing, so wait for the cache writes here.
    for handle in outcome.pending_writes {
        if let Err(e) = handle.await {
            log::error!("Cache write task failed: {e}");
        }
    }

    let summary = DashboardSummary::build(&districts, &outcome.risks, top);

    if json {
        println!("{}", refresh_json(outcome.status, outcome.risks, summary)?);
        return Ok(());
    }

    match outcome.status {
        RefreshStatus::NotConfigured => println!("{NOT_CONFIGURED_MESSAGE}\n"),
        RefreshStatus::Refreshed {
            reused,
            recomputed,
            failed,
        } => println!("{recomputed} recomputed, {reused} from cache, {failed} failed\n"),
    }

    if outcome.risks.is_empty() {
        println!("No district risk data available.");
        return Ok(());
    }

    if let Some(highest) = &summary.highest {
        println!(
            "Highest risk: {} ({}, {})\n",
            highest.risk.name,
            highest.risk.risk_level,
            highest.tier.label()
        );
    }

    println!("Top {} districts:", summary.top.len());
    print_risk_header();
    for ranked in &summary.top {
        println!("{}", format_risk_row(&ranked.risk));
    }

    let missing: Vec<&str> = summary
        .tiers
        .iter()
        .filter(|t| t.tier == SeverityTier::NoData)
        .map(|t| t.name.as_str())
        .collect();
    if !missing.is_empty() {
        println!("\nNo data: {}", missing.join(", "));
    }

    Ok(())
}

/// Prints every cached record without refreshing.
pub async fn cached() -> CliResult {
    let db = open_db(Path::new(&db_path_from_env())).await?;
    let store = SqliteRiskStore::new(db);
    let risks = store.get_all().await;

    if risks.is_empty() {
        println!("No cached district risks.");
        return Ok(());
    }

    print_risk_header();
    for risk in &risks {
        println!("{}", format_risk_row(risk));
    }
    println!("\n{} district(s) cached", risks.len());

    Ok(())
}

/// Stores a health report.
pub async fn report_case(
    district: String,
    cases: u32,
    deaths: u32,
    reporter: String,
    date: Option<NaiveDate>,
) -> CliResult {
    let db = open_db(Path::new(&db_path_from_env())).await?;
    let store = HealthReportStore::new(db);

    let report = NewHealthReport {
        district_name: district,
        reported_date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        cases,
        deaths,
        reported_by_id: reporter,
    };

    let stored = store.insert(&report, &sri_lanka_districts()).await?;
    println!(
        "Recorded report {} for {} on {}: {} case(s), {} death(s)",
        stored.id, stored.district_name, stored.reported_date, stored.cases, stored.deaths
    );

    Ok(())
}

/// Prints health reports (optionally for one district) and case totals.
pub async fn cases(district: Option<String>) -> CliResult {
    let db = open_db(Path::new(&db_path_from_env())).await?;
    let store = HealthReportStore::new(db);
    let reports = store.list(district.as_deref()).await?;

    if reports.is_empty() {
        println!("No health reports found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<16} {:>6} {:>6}  REPORTER",
        "DATE", "DISTRICT", "CASES", "DEATHS"
    );
    println!("{}", "-".repeat(60));
    for report in &reports {
        println!("{}", format_report_row(report));
    }

    let summaries = summarize_cases(&sri_lanka_districts(), &reports);
    println!("\nTotals by district:");
    for summary in &summaries {
        println!("{}", format_summary_row(summary));
    }
    println!("\n{}", format_national(&national_totals(&summaries)));

    Ok(())
}

/// Renders a refresh the same way `GET /api/district-risks` does, so the
/// not-configured state stays visible to scripts.
fn refresh_json(
    status: RefreshStatus,
    risks: Vec<DistrictRisk>,
    summary: DashboardSummary,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ApiDistrictRisks::new(status, risks, summary))
}

fn print_risk_header() {
    println!(
        "{:<16} {:>5}  {:<10} {:>8} {:>6} {:>8}  UPDATED",
        "DISTRICT", "RISK", "TIER", "TEMP", "HUMID", "RAIN"
    );
    println!("{}", "-".repeat(80));
}

fn format_risk_row(risk: &DistrictRisk) -> String {
    let tier = SeverityTier::from_risk_level(Some(risk.risk_level.value()));
    format!(
        "{:<16} {:>5}  {:<10} {:>6.1}°C {:>5.0}% {:>6.1}mm  {}",
        risk.name,
        risk.risk_level.to_string(),
        tier.label(),
        risk.temperature,
        risk.humidity,
        risk.rainfall,
        risk.updated_at.format("%Y-%m-%d %H:%M")
    )
}

fn format_report_row(report: &DistrictHealthReport) -> String {
    format!(
        "{:<12} {:<16} {:>6} {:>6}  {}",
        report.reported_date.to_string(),
        report.district_name,
        report.cases,
        report.deaths,
        report.reported_by_id
    )
}

fn format_summary_row(summary: &DistrictCaseSummary) -> String {
    let latest = summary
        .latest_report_date
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    format!(
        "  {:<16} {:>6} case(s) {:>4} death(s) in {} report(s), latest {latest}",
        summary.district_name, summary.total_cases, summary.total_deaths, summary.report_count
    )
}

fn format_national(totals: &NationalTotals) -> String {
    format!(
        "National: {} case(s), {} death(s) across {} district(s)",
        totals.total_cases, totals.total_deaths, totals.districts_reporting
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dengue_watch_district_models::{RiskAssessment, RiskLevel, WeatherReading};

    #[test]
    fn risk_row_shows_level_tier_and_readings() {
        let updated_at: DateTime<Utc> = "2026-10-15T09:30:00Z".parse().unwrap();
        let risk = DistrictRisk::from_parts(
            "Colombo",
            WeatherReading {
                temperature: 30.0,
                humidity: 85.0,
                rainfall: 2.0,
            },
            RiskAssessment::new(RiskLevel::new(8).unwrap(), "High").unwrap(),
            updated_at,
        );

        let row = format_risk_row(&risk);

        assert!(row.starts_with("Colombo"));
        assert!(row.contains("8/10"));
        assert!(row.contains("high"));
        assert!(row.contains("30.0°C"));
        assert!(row.contains("85%"));
        assert!(row.contains("2.0mm"));
        assert!(row.ends_with("2026-10-15 09:30"));
    }

    #[test]
    fn json_output_reports_not_configured() {
        let districts = sri_lanka_districts();
        let summary = DashboardSummary::build(&districts, &[], 5);

        let json = refresh_json(RefreshStatus::NotConfigured, Vec::new(), summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "notConfigured");
        assert_eq!(value["message"], NOT_CONFIGURED_MESSAGE);
        assert!(value.get("counts").is_none());
        assert_eq!(value["risks"].as_array().unwrap().len(), 0);
        assert_eq!(value["summary"]["tiers"].as_array().unwrap().len(), 25);
    }

    #[test]
    fn json_output_reports_refresh_counts() {
        let districts = sri_lanka_districts();
        let summary = DashboardSummary::build(&districts, &[], 5);
        let status = RefreshStatus::Refreshed {
            reused: 20,
            recomputed: 4,
            failed: 1,
        };

        let value: serde_json::Value =
            serde_json::from_str(&refresh_json(status, Vec::new(), summary).unwrap()).unwrap();

        assert_eq!(value["status"], "refreshed");
        assert_eq!(value["counts"]["failed"], 1);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn summary_row_handles_missing_date() {
        let row = format_summary_row(&DistrictCaseSummary {
            district_name: "Jaffna".to_string(),
            total_cases: 3,
            total_deaths: 0,
            report_count: 1,
            latest_report_date: None,
        });
        assert!(row.contains("Jaffna"));
        assert!(row.ends_with("latest -"));
    }

    #[test]
    fn national_line_reports_totals() {
        let line = format_national(&NationalTotals {
            total_cases: 40,
            total_deaths: 2,
            districts_reporting: 5,
        });
        assert_eq!(
            line,
            "National: 40 case(s), 2 death(s) across 5 district(s)"
        );
    }
}
