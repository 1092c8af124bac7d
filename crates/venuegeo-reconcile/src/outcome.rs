//! Per-record results of a reconciliation run.

use serde::Serialize;
use venuegeo_core::{Coordinates, LocationRecord, RecordId};
use venuegeo_geocoder::{GeocodeCandidate, GeocodeError};

/// Final state of one record after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The chosen candidate's coordinates were written to the store.
    Applied,
    /// The provider answered with an empty candidate list.
    SkippedNoCandidate,
    /// Candidates came back but none reached the relevance threshold.
    SkippedLowConfidence,
    /// Something went wrong; see the attached [`OutcomeError`].
    Failed,
}

impl OutcomeStatus {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::SkippedNoCandidate => "skipped_no_candidate",
            Self::SkippedLowConfidence => "skipped_low_confidence",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Why a record ended up [`OutcomeStatus::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeErrorKind {
    InvalidAddress,
    ProviderRateLimited,
    ProviderUnavailable,
    MalformedResponse,
    StoreWriteFailed,
    Cancelled,
}

impl OutcomeErrorKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidAddress => "invalid_address",
            Self::ProviderRateLimited => "provider_rate_limited",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::MalformedResponse => "malformed_response",
            Self::StoreWriteFailed => "store_write_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A record-local failure with a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeError {
    pub kind: OutcomeErrorKind,
    pub message: String,
}

impl OutcomeError {
    #[must_use]
    pub fn new(kind: OutcomeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Maps a provider error that survived the retry policy.
    ///
    /// A `RateLimited` error reaching this point means retries were
    /// exhausted, which is reported as the provider being unavailable.
    #[must_use]
    pub fn from_provider(err: &GeocodeError) -> Self {
        let kind = match err {
            GeocodeError::InvalidAddress => OutcomeErrorKind::InvalidAddress,
            e if e.is_malformed() => OutcomeErrorKind::MalformedResponse,
            _ => OutcomeErrorKind::ProviderUnavailable,
        };
        Self::new(kind, err.to_string())
    }
}

impl std::fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

/// Everything the run learned about one record.
///
/// `chosen_candidate` is set whenever the selector picked a candidate, even
/// if the write that followed failed. `new_coordinates` is set only when the
/// write succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationOutcome {
    pub record_id: RecordId,
    pub display_name: String,
    /// The record's address text exactly as stored. The provider receives
    /// the trimmed form.
    pub address_used: String,
    /// Redacted description of the provider request; empty when none was made.
    pub request_descriptor: String,
    pub chosen_candidate: Option<GeocodeCandidate>,
    pub previous_coordinates: Option<Coordinates>,
    pub new_coordinates: Option<Coordinates>,
    pub status: OutcomeStatus,
    pub error: Option<OutcomeError>,
    /// Provider calls made for this record, retries included.
    pub attempts: u32,
    /// Highest relevance seen when the record was skipped for low confidence.
    pub best_relevance: Option<f64>,
    pub min_relevance: f64,
}

impl ReconciliationOutcome {
    /// Starts an outcome for `record`; the engine fills in the rest.
    pub(crate) fn draft(record: &LocationRecord, min_relevance: f64) -> Self {
        Self {
            record_id: record.id.clone(),
            display_name: record.display_name.clone(),
            address_used: record.address_text.clone(),
            request_descriptor: String::new(),
            chosen_candidate: None,
            previous_coordinates: record.current,
            new_coordinates: None,
            status: OutcomeStatus::Failed,
            error: None,
            attempts: 0,
            best_relevance: None,
            min_relevance,
        }
    }

    pub(crate) fn failed(mut self, error: OutcomeError) -> Self {
        self.status = OutcomeStatus::Failed;
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.status == OutcomeStatus::Applied
    }

    /// Distance between the previous coordinates and the chosen candidate.
    #[must_use]
    pub fn drift_meters(&self) -> Option<f64> {
        let previous = self.previous_coordinates?;
        let chosen = self.chosen_candidate.as_ref()?.coordinates();
        Some(previous.distance_meters(&chosen))
    }
}
