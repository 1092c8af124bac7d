//! Auditable JSON report built from run outcomes.
//!
//! The report is a pure projection of the outcomes: one entry per outcome,
//! in the same order, with enough detail for a human to check every pin.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::outcome::{OutcomeStatus, ReconciliationOutcome};

const MAP_SEARCH_BASE: &str = "https://www.google.com/maps/search/?api=1&query=";

/// One report line per reconciled record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub record_id: String,
    pub name: String,
    pub location_name: String,
    /// Redacted provider request; empty when no request was made.
    pub geocode_request: String,
    pub raw_response: Option<serde_json::Value>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub old_latitude: Option<f64>,
    pub old_longitude: Option<f64>,
    pub place_name: Option<String>,
    pub relevance: Option<f64>,
    pub error: Option<String>,
    pub status: OutcomeStatus,
    pub map_url: String,
    pub drift_meters: Option<f64>,
}

/// Per-status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub applied: usize,
    pub skipped_no_candidate: usize,
    pub skipped_low_confidence: usize,
    pub failed: usize,
}

/// Response body for a run that completed (possibly with record failures).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub success: bool,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<ReportEntry>,
    pub summary: ReportSummary,
}

/// Response body for a run that could not start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub success: bool,
    pub error: String,
}

impl FailureReport {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl ReconciliationReport {
    /// The body returned when a run cannot start at all.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> FailureReport {
        FailureReport::new(message)
    }
}

/// Builds the report for `outcomes`, stamped with the current time.
#[must_use]
pub fn build_report(outcomes: &[ReconciliationOutcome]) -> ReconciliationReport {
    build_report_at(outcomes, Utc::now())
}

/// Builds the report for `outcomes` with an explicit timestamp.
#[must_use]
pub fn build_report_at(
    outcomes: &[ReconciliationOutcome],
    generated_at: DateTime<Utc>,
) -> ReconciliationReport {
    let mut summary = ReportSummary {
        total: outcomes.len(),
        ..ReportSummary::default()
    };
    for outcome in outcomes {
        match outcome.status {
            OutcomeStatus::Applied => summary.applied += 1,
            OutcomeStatus::SkippedNoCandidate => summary.skipped_no_candidate += 1,
            OutcomeStatus::SkippedLowConfidence => summary.skipped_low_confidence += 1,
            OutcomeStatus::Failed => summary.failed += 1,
        }
    }

    ReconciliationReport {
        success: true,
        generated_at,
        results: outcomes.iter().map(entry_for).collect(),
        summary,
    }
}

/// Map-search link a reviewer can open to eyeball `address`.
#[must_use]
pub fn map_search_url(address: &str) -> String {
    format!(
        "{MAP_SEARCH_BASE}{}",
        utf8_percent_encode(address, NON_ALPHANUMERIC)
    )
}

fn entry_for(outcome: &ReconciliationOutcome) -> ReportEntry {
    let candidate = outcome.chosen_candidate.as_ref();
    let chosen = candidate.map(venuegeo_geocoder::GeocodeCandidate::coordinates);

    ReportEntry {
        record_id: outcome.record_id.to_string(),
        name: outcome.display_name.clone(),
        location_name: outcome.address_used.clone(),
        geocode_request: outcome.request_descriptor.clone(),
        raw_response: candidate
            .filter(|_| outcome.is_applied())
            .map(|c| c.raw.clone()),
        latitude: chosen.map(|c| c.latitude),
        longitude: chosen.map(|c| c.longitude),
        old_latitude: outcome.previous_coordinates.map(|c| c.latitude),
        old_longitude: outcome.previous_coordinates.map(|c| c.longitude),
        place_name: candidate.map(|c| c.display_place_name.clone()),
        relevance: candidate.map(|c| c.relevance),
        error: error_text(outcome),
        status: outcome.status,
        map_url: map_search_url(outcome.address_used.trim()),
        drift_meters: outcome.drift_meters(),
    }
}

fn error_text(outcome: &ReconciliationOutcome) -> Option<String> {
    match outcome.status {
        OutcomeStatus::Applied => None,
        OutcomeStatus::SkippedNoCandidate => {
            Some("no_candidate: geocoder returned no results".to_owned())
        }
        OutcomeStatus::SkippedLowConfidence => Some(match outcome.best_relevance {
            Some(best) => format!(
                "low_confidence: best relevance {best} is below threshold {}",
                outcome.min_relevance
            ),
            None => format!(
                "low_confidence: no candidate reached threshold {}",
                outcome.min_relevance
            ),
        }),
        OutcomeStatus::Failed => Some(
            outcome
                .error
                .as_ref()
                .map_or_else(|| "failed".to_owned(), ToString::to_string),
        ),
    }
}
