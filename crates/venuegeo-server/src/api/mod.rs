mod reconcile;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use venuegeo_core::RecordStore;
use venuegeo_db::PgRecordStore;
use venuegeo_geocoder::GeocodeProvider;
use venuegeo_reconcile::{ReconcileConfig, ReconciliationEngine};

use crate::middleware::{request_id, RequestId};

/// Reports whether the backing store is reachable.
pub trait HealthProbe: Send + Sync {
    fn check(&self) -> impl Future<Output = Result<(), String>> + Send;
}

impl HealthProbe for PgRecordStore {
    async fn check(&self) -> Result<(), String> {
        venuegeo_db::health_check(self.pool())
            .await
            .map_err(|e| e.to_string())
    }
}

pub struct AppState<P, S> {
    pub engine: Arc<ReconciliationEngine<P, S>>,
    pub reconcile: ReconcileConfig,
    pub run_timeout: Duration,
    /// Held for the duration of a run; a second trigger fails fast.
    pub run_guard: Arc<Mutex<()>>,
}

impl<P, S> AppState<P, S> {
    pub fn new(
        engine: ReconciliationEngine<P, S>,
        reconcile: ReconcileConfig,
        run_timeout: Duration,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            reconcile,
            run_timeout,
            run_guard: Arc::new(Mutex::new(())),
        }
    }
}

impl<P, S> Clone for AppState<P, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            reconcile: self.reconcile,
            run_timeout: self.run_timeout,
            run_guard: Arc::clone(&self.run_guard),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app<P, S>(state: AppState<P, S>) -> Router
where
    P: GeocodeProvider + 'static,
    S: RecordStore + HealthProbe + 'static,
{
    Router::new()
        .route("/api/v1/health", get(health::<P, S>))
        .route(
            "/api/v1/geocode/reconcile",
            post(reconcile::trigger_reconcile::<P, S>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health<P, S>(
    State(state): State<AppState<P, S>>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse
where
    P: GeocodeProvider + 'static,
    S: RecordStore + HealthProbe + 'static,
{
    let meta = ResponseMeta::new(req_id.0);

    match state.engine.store().check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tower::ServiceExt;
    use venuegeo_core::{Coordinates, LocationRecord, ReconcileScope, RecordId, StoreError};
    use venuegeo_geocoder::{GeocodeCandidate, GeocodeError};

    /// Answers every address with one high-relevance candidate, except
    /// addresses containing "unknown" which get no candidates.
    #[derive(Default)]
    struct StubProvider {
        calls: AtomicUsize,
    }

    impl GeocodeProvider for StubProvider {
        fn describe_request(&self, address_text: &str) -> String {
            format!("GET stub://geocode/{address_text}?access_token=redacted")
        }

        async fn geocode(&self, address_text: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if address_text.contains("unknown") {
                return Ok(Vec::new());
            }
            Ok(vec![GeocodeCandidate {
                display_place_name: format!("{address_text}, United Kingdom"),
                longitude: -0.279_884,
                latitude: 51.556_021,
                relevance: 0.97,
                raw: serde_json::json!({ "place_name": address_text }),
            }])
        }
    }

    #[derive(Default)]
    struct StubStore {
        records: Vec<LocationRecord>,
        fail_listing: bool,
        healthy: AtomicBool,
        writes: std::sync::Mutex<Vec<(RecordId, Coordinates)>>,
    }

    impl RecordStore for StubStore {
        async fn list_records(&self, scope: ReconcileScope) -> Result<Vec<LocationRecord>, StoreError> {
            if self.fail_listing {
                return Err(StoreError::Unavailable(Box::new(std::io::Error::other(
                    "connection refused",
                ))));
            }
            Ok(self
                .records
                .iter()
                .filter(|r| scope == ReconcileScope::All || r.current.is_none())
                .cloned()
                .collect())
        }

        async fn write_coordinates(&self, id: &RecordId, coordinates: Coordinates) -> Result<(), StoreError> {
            self.writes.lock().unwrap().push((id.clone(), coordinates));
            Ok(())
        }
    }

    impl HealthProbe for StubStore {
        async fn check(&self) -> Result<(), String> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err("connection refused".to_owned())
            }
        }
    }

    fn venue(id: &str, address: &str, current: Option<Coordinates>) -> LocationRecord {
        LocationRecord {
            id: RecordId::from(id),
            display_name: format!("Event {id}"),
            address_text: address.to_owned(),
            current,
        }
    }

    fn state_with(store: StubStore) -> AppState<StubProvider, StubStore> {
        AppState::new(
            ReconciliationEngine::new(StubProvider::default(), store),
            ReconcileConfig {
                retry_backoff_base_ms: 0,
                ..ReconcileConfig::default()
            },
            Duration::from_secs(30),
        )
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[tokio::test]
    async fn reconcile_returns_ordered_report() {
        let store = StubStore {
            records: vec![
                venue("a", "Wembley Stadium, London", Some(Coordinates::new(51.0, -0.1))),
                venue("b", "unknown place", None),
                venue("c", "  ", None),
            ],
            ..StubStore::default()
        };
        let state = state_with(store);
        let app = build_app(state.clone());

        let response = app.oneshot(post("/api/v1/geocode/reconcile")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json = json_body(response).await;
        assert_eq!(json["success"], true);

        let results = json["results"].as_array().expect("results array");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["name"], "Event a");
        assert_eq!(results[0]["status"], "applied");
        assert_eq!(results[0]["latitude"].as_f64(), Some(51.556_021));
        assert_eq!(results[0]["longitude"].as_f64(), Some(-0.279_884));
        assert_eq!(results[0]["old_latitude"].as_f64(), Some(51.0));
        assert!(results[0]["raw_response"].is_object());
        assert_eq!(
            results[0]["map_url"],
            "https://www.google.com/maps/search/?api=1&query=Wembley%20Stadium%2C%20London"
        );
        assert_eq!(results[1]["status"], "skipped_no_candidate");
        assert_eq!(results[2]["status"], "failed");
        assert!(results[2]["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("invalid_address: ")));

        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["summary"]["applied"], 1);
        assert_eq!(state.engine.store().writes.lock().unwrap().len(), 1);
        assert_eq!(state.engine.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reconcile_missing_scope_skips_records_with_coordinates() {
        let store = StubStore {
            records: vec![
                venue("a", "Wembley Stadium, London", Some(Coordinates::new(51.0, -0.1))),
                venue("b", "Old Trafford, Manchester", None),
            ],
            ..StubStore::default()
        };
        let app = build_app(state_with(store));

        let response = app
            .oneshot(post("/api/v1/geocode/reconcile?scope=missing"))
            .await
            .expect("response");

        let json = json_body(response).await;
        let results = json["results"].as_array().expect("results array");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["record_id"], "b");
    }

    #[tokio::test]
    async fn reconcile_unknown_scope_is_bad_request() {
        let app = build_app(state_with(StubStore::default()));

        let response = app
            .oneshot(post("/api/v1/geocode/reconcile?scope=stale"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn reconcile_listing_failure_is_500_with_failure_shape() {
        let store = StubStore {
            fail_listing: true,
            ..StubStore::default()
        };
        let app = build_app(state_with(store));

        let response = app.oneshot(post("/api/v1/geocode/reconcile")).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .is_some_and(|e| e.contains("failed to list records")));
        assert!(json.get("results").is_none());
    }

    #[tokio::test]
    async fn reconcile_rejects_concurrent_run() {
        let state = state_with(StubStore::default());
        let _held = state.run_guard.clone().try_lock_owned().expect("guard free");
        let app = build_app(state);

        let response = app.oneshot(post("/api/v1/geocode/reconcile")).await.expect("response");

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn health_reports_store_state() {
        let healthy = StubStore::default();
        healthy.healthy.store(true, Ordering::SeqCst);
        let response = build_app(state_with(healthy))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-42");
        let json = json_body(response).await;
        assert_eq!(json["data"]["database"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-42");

        let response = build_app(state_with(StubStore::default()))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
