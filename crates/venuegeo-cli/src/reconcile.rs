//! `reconcile` command handler.
//!
//! Runs one reconciliation against the venues table and prints either a
//! per-venue table or the same JSON report the HTTP endpoint returns.

use std::time::Duration;

use venuegeo_core::ReconcileScope;
use venuegeo_db::PgRecordStore;
use venuegeo_geocoder::{GeocoderSettings, MapboxGeocoder};
use venuegeo_reconcile::{
    build_report, cancellation, OutcomeStatus, ReconcileConfig, ReconciliationEngine,
    ReconciliationReport, ReportEntry,
};

pub(crate) async fn run_reconcile(
    pool: sqlx::PgPool,
    config: &venuegeo_core::AppConfig,
    missing_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    let geocoder = MapboxGeocoder::new(&GeocoderSettings::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build geocoder client: {e}"))?;
    let engine = ReconciliationEngine::new(geocoder, PgRecordStore::new(pool));
    let scope = scope_for(missing_only);
    tracing::info!(
        ?scope,
        timeout_secs = config.run_timeout_secs,
        "starting reconcile command"
    );

    let (handle, token) = cancellation();
    let deadline = handle.cancel_after(Duration::from_secs(config.run_timeout_secs));
    let result = engine
        .run_from_store(scope, &ReconcileConfig::from_app_config(config), &token)
        .await;
    deadline.abort();

    let outcomes = match result {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::error!(error = %e, "reconcile could not start");
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ReconciliationReport::failed(e.to_string()))?
                );
            }
            return Err(e.into());
        }
    };

    let report = build_report(&outcomes);
    if report.summary.failed > 0 {
        tracing::warn!(
            failed = report.summary.failed,
            total = report.summary.total,
            "some venues could not be reconciled"
        );
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in &report.results {
            println!("{}", format_entry(entry));
        }
        println!(
            "\n{} venues: {} applied, {} no candidate, {} low confidence, {} failed",
            report.summary.total,
            report.summary.applied,
            report.summary.skipped_no_candidate,
            report.summary.skipped_low_confidence,
            report.summary.failed,
        );
    }

    Ok(())
}

pub(crate) fn scope_for(missing_only: bool) -> ReconcileScope {
    if missing_only {
        ReconcileScope::MissingCoordinates
    } else {
        ReconcileScope::All
    }
}

fn marker(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Applied => "\u{2713}",
        OutcomeStatus::SkippedNoCandidate | OutcomeStatus::SkippedLowConfidence => "~",
        OutcomeStatus::Failed => "\u{2717}",
    }
}

fn fmt_pair(latitude: Option<f64>, longitude: Option<f64>) -> String {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => format!("({lat}, {lon})"),
        _ => "\u{2014}".to_string(),
    }
}

/// One table line, plus the verification link on its own line.
pub(crate) fn format_entry(entry: &ReportEntry) -> String {
    let detail = match entry.status {
        OutcomeStatus::Applied => {
            let drift = entry
                .drift_meters
                .map(|d| format!(" drift {d:.0} m"))
                .unwrap_or_default();
            format!(
                "{} -> {} \"{}\"{drift}",
                fmt_pair(entry.old_latitude, entry.old_longitude),
                fmt_pair(entry.latitude, entry.longitude),
                entry.place_name.as_deref().unwrap_or_default(),
            )
        }
        _ => entry.error.clone().unwrap_or_default(),
    };

    format!(
        "{} {} | {} | {}\n    {}",
        marker(entry.status),
        entry.name,
        entry.location_name,
        detail,
        entry.map_url
    )
}
