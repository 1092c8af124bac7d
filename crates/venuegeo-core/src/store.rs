//! The record storage capability consumed by the reconciliation engine.

use std::future::Future;

use thiserror::Error;

use crate::location::{Coordinates, LocationRecord, RecordId};

/// Which stored records a run should consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileScope {
    /// Every active record.
    #[default]
    All,
    /// Only records that have no stored coordinate pair yet.
    MissingCoordinates,
}

impl ReconcileScope {
    /// Parses the `scope` query/flag value (`all` or `missing`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "missing" => Some(Self::MissingCoordinates),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation.
    #[error("record store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The record disappeared between listing and writing.
    #[error("record {0} not found")]
    NotFound(RecordId),
}

/// Storage for location records.
///
/// `write_coordinates` must apply both components of the pair in a single
/// atomic update: either the whole pair is stored or nothing changes.
pub trait RecordStore: Send + Sync {
    /// Lists the records a run should reconcile, in a stable order.
    fn list_records(
        &self,
        scope: ReconcileScope,
    ) -> impl Future<Output = Result<Vec<LocationRecord>, StoreError>> + Send;

    /// Replaces the stored coordinate pair of record `id`.
    fn write_coordinates(
        &self,
        id: &RecordId,
        coordinates: Coordinates,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
