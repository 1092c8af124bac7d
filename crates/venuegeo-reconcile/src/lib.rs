//! Geocoding reconciliation: rewrites stored venue coordinates so they match
//! each venue's address text, and reports what changed.

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod report;
mod retry;
pub mod selector;

pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use config::ReconcileConfig;
pub use engine::ReconciliationEngine;
pub use error::ReconcileError;
pub use outcome::{OutcomeError, OutcomeErrorKind, OutcomeStatus, ReconciliationOutcome};
pub use report::{
    build_report, build_report_at, map_search_url, FailureReport, ReconciliationReport, ReportEntry,
    ReportSummary,
};
pub use selector::{classify, select, Selection};
