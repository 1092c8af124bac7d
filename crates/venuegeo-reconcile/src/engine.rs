//! Batch reconciliation over a set of location records.

use futures::stream::{self, StreamExt};
use venuegeo_core::{LocationRecord, ReconcileScope, RecordStore};
use venuegeo_geocoder::GeocodeProvider;

use crate::cancel::CancelToken;
use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::outcome::{OutcomeError, OutcomeErrorKind, OutcomeStatus, ReconciliationOutcome};
use crate::retry::{retry_rate_limited, LookupFailure};
use crate::selector::{classify, Selection};

/// Geocodes each record's address and writes the chosen coordinates back.
///
/// The engine holds its two capabilities and nothing else: no environment,
/// no globals. A run never aborts because of one record; every record in
/// the input gets exactly one outcome, in input order.
#[derive(Debug)]
pub struct ReconciliationEngine<P, S> {
    provider: P,
    store: S,
}

impl<P, S> ReconciliationEngine<P, S>
where
    P: GeocodeProvider,
    S: RecordStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconciles `records` without a cancellation signal.
    pub async fn run(
        &self,
        records: Vec<LocationRecord>,
        config: &ReconcileConfig,
    ) -> Vec<ReconciliationOutcome> {
        self.run_with_cancel(records, config, &CancelToken::never())
            .await
    }

    /// Reconciles `records` with at most `config.concurrency` in flight.
    ///
    /// Outcomes come back in input order regardless of completion order. A
    /// record sleeping through rate-limit backoff holds only its own slot;
    /// the other slots keep pulling new records.
    pub async fn run_with_cancel(
        &self,
        records: Vec<LocationRecord>,
        config: &ReconcileConfig,
        cancel: &CancelToken,
    ) -> Vec<ReconciliationOutcome> {
        let total = records.len();
        let concurrency = config.concurrency.max(1);
        tracing::info!(
            total,
            concurrency,
            min_relevance = config.min_relevance,
            "starting geocode reconciliation"
        );

        let mut indexed: Vec<(usize, ReconciliationOutcome)> =
            stream::iter(records.into_iter().enumerate())
                .map(|(index, record)| async move {
                    (index, self.reconcile_record(record, config, cancel).await)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        indexed.sort_unstable_by_key(|(index, _)| *index);
        let outcomes: Vec<ReconciliationOutcome> =
            indexed.into_iter().map(|(_, outcome)| outcome).collect();

        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        tracing::info!(
            total,
            applied = count(OutcomeStatus::Applied),
            skipped_no_candidate = count(OutcomeStatus::SkippedNoCandidate),
            skipped_low_confidence = count(OutcomeStatus::SkippedLowConfidence),
            failed = count(OutcomeStatus::Failed),
            "geocode reconciliation finished"
        );
        outcomes
    }

    /// Lists records from the store, then reconciles them.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ListRecords`] if the store cannot list
    /// records. Per-record failures are reported in the outcomes instead.
    pub async fn run_from_store(
        &self,
        scope: ReconcileScope,
        config: &ReconcileConfig,
        cancel: &CancelToken,
    ) -> Result<Vec<ReconciliationOutcome>, ReconcileError> {
        let records = self.store.list_records(scope).await?;
        Ok(self.run_with_cancel(records, config, cancel).await)
    }

    async fn reconcile_record(
        &self,
        record: LocationRecord,
        config: &ReconcileConfig,
        cancel: &CancelToken,
    ) -> ReconciliationOutcome {
        let mut outcome = ReconciliationOutcome::draft(&record, config.min_relevance);

        let Some(address) = record.usable_address() else {
            tracing::warn!(record_id = %record.id, name = %record.display_name, "address text is empty");
            return outcome.failed(OutcomeError::new(
                OutcomeErrorKind::InvalidAddress,
                "address text is empty",
            ));
        };

        if cancel.is_cancelled() {
            return outcome.failed(OutcomeError::new(
                OutcomeErrorKind::Cancelled,
                "run cancelled before the record was geocoded",
            ));
        }

        outcome.request_descriptor = self.provider.describe_request(address);
        let lookup = retry_rate_limited(
            config.max_retries,
            config.retry_backoff_base_ms,
            cancel,
            || self.provider.geocode(address),
        )
        .await;
        outcome.attempts = lookup.attempts;

        let candidates = match lookup.result {
            Ok(candidates) => candidates,
            Err(failure) => {
                let error = match failure {
                    LookupFailure::Provider(e) => OutcomeError::from_provider(&e),
                    LookupFailure::RetriesExhausted(e) => OutcomeError::new(
                        OutcomeErrorKind::ProviderUnavailable,
                        format!("still rate limited after {} attempts ({e})", lookup.attempts),
                    ),
                    LookupFailure::Cancelled => OutcomeError::new(
                        OutcomeErrorKind::Cancelled,
                        "run cancelled during rate-limit backoff",
                    ),
                };
                tracing::warn!(record_id = %record.id, error = %error, "geocode lookup failed");
                return outcome.failed(error);
            }
        };

        match classify(&candidates, config.min_relevance) {
            Selection::Empty => {
                tracing::info!(record_id = %record.id, address, "geocoder returned no candidates");
                outcome.status = OutcomeStatus::SkippedNoCandidate;
            }
            Selection::BelowThreshold { best_relevance } => {
                tracing::info!(
                    record_id = %record.id,
                    best_relevance,
                    min_relevance = config.min_relevance,
                    "no candidate reached the relevance threshold"
                );
                outcome.status = OutcomeStatus::SkippedLowConfidence;
                outcome.best_relevance = Some(best_relevance);
            }
            Selection::Chosen(candidate) => {
                let coordinates = candidate.coordinates();
                outcome.chosen_candidate = Some(candidate.clone());

                if let Err(e) = self.store.write_coordinates(&record.id, coordinates).await {
                    tracing::error!(record_id = %record.id, error = %e, "failed to write coordinates");
                    return outcome.failed(OutcomeError::new(
                        OutcomeErrorKind::StoreWriteFailed,
                        e.to_string(),
                    ));
                }

                tracing::info!(
                    record_id = %record.id,
                    place_name = %candidate.display_place_name,
                    latitude = coordinates.latitude,
                    longitude = coordinates.longitude,
                    relevance = candidate.relevance,
                    drift_meters = outcome.drift_meters(),
                    "coordinates applied"
                );
                outcome.new_coordinates = Some(coordinates);
                outcome.status = OutcomeStatus::Applied;
            }
        }

        outcome
    }
}
