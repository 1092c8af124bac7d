use thiserror::Error;
use venuegeo_core::StoreError;

/// Batch-level failure: the run could not start at all.
///
/// Everything that goes wrong for an individual record is reported in that
/// record's outcome instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to list records: {0}")]
    ListRecords(#[from] StoreError),
}
