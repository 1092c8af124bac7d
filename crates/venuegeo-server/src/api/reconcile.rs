use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use venuegeo_core::{RecordStore, ReconcileScope};
use venuegeo_geocoder::GeocodeProvider;
use venuegeo_reconcile::{build_report, cancellation, ReconciliationReport};

use super::AppState;
use crate::middleware::RequestId;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ReconcileParams {
    pub scope: Option<String>,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ReconciliationReport::failed(message))).into_response()
}

/// `POST /api/v1/geocode/reconcile`
///
/// Runs one reconciliation over the stored venues and returns the report.
/// Only one run may be in flight at a time.
pub(super) async fn trigger_reconcile<P, S>(
    State(state): State<AppState<P, S>>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ReconcileParams>,
) -> Response
where
    P: GeocodeProvider + 'static,
    S: RecordStore + 'static,
{
    let scope = match params.scope.as_deref() {
        None => ReconcileScope::All,
        Some(raw) => match ReconcileScope::parse(raw) {
            Some(scope) => scope,
            None => {
                return failure(
                    StatusCode::BAD_REQUEST,
                    format!("unknown scope '{raw}'; expected 'all' or 'missing'"),
                )
            }
        },
    };

    let Ok(guard) = state.run_guard.clone().try_lock_owned() else {
        tracing::warn!(request_id = %req_id.0, "reconcile rejected: run already in progress");
        return failure(
            StatusCode::CONFLICT,
            "a geocode reconciliation run is already in progress",
        );
    };

    tracing::info!(request_id = %req_id.0, ?scope, "geocode reconciliation requested");

    // The run is detached from the request so a dropped connection does not
    // abandon records halfway.
    let engine = state.engine.clone();
    let config = state.reconcile;
    let run_timeout = state.run_timeout;
    let run = tokio::spawn(async move {
        let _guard = guard;
        let (handle, token) = cancellation();
        let deadline = handle.cancel_after(run_timeout);
        let result = engine.run_from_store(scope, &config, &token).await;
        deadline.abort();
        result
    });

    match run.await {
        Ok(Ok(outcomes)) => (StatusCode::OK, Json(build_report(&outcomes))).into_response(),
        Ok(Err(e)) => {
            tracing::error!(request_id = %req_id.0, error = %e, "geocode reconciliation could not start");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "geocode reconciliation task failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "geocode reconciliation task failed",
            )
        }
    }
}
