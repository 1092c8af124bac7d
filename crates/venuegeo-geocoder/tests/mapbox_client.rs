//! Integration tests for `MapboxGeocoder` using wiremock HTTP mocks.

use serde_json::json;
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use venuegeo_geocoder::{GeocodeError, GeocodeProvider, GeocoderSettings, MapboxGeocoder};

const PLACES_PATH: &str = r"^/geocoding/v5/mapbox\.places/.+\.json$";

fn test_geocoder(base_url: &str) -> MapboxGeocoder {
    let mut settings = GeocoderSettings::with_token("test-token");
    settings.base_url = base_url.to_owned();
    settings.timeout_secs = 5;
    MapboxGeocoder::new(&settings).expect("geocoder construction should not fail")
}

fn wembley_body() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "query": ["wembley", "stadium", "london"],
        "features": [
            {
                "id": "poi.8590",
                "type": "Feature",
                "place_type": ["poi"],
                "relevance": 0.98,
                "text": "Wembley Stadium",
                "place_name": "Wembley Stadium, Wembley, London HA9 0WS, United Kingdom",
                "center": [-0.279_884, 51.556_021],
                "geometry": { "type": "Point", "coordinates": [-0.279_884, 51.556_021] }
            },
            {
                "id": "locality.1",
                "type": "Feature",
                "place_type": ["locality"],
                "relevance": 0.7,
                "text": "Wembley",
                "place_name": "Wembley, London, United Kingdom",
                "center": [-0.3, 51.55],
                "geometry": { "type": "Point", "coordinates": [-0.3, 51.55] }
            }
        ],
        "attribution": "NOTICE: (c) Mapbox"
    })
}

#[tokio::test]
async fn geocode_returns_candidates_in_provider_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .and(query_param("access_token", "test-token"))
        .and(query_param("limit", "5"))
        .and(query_param("autocomplete", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wembley_body()))
        .expect(1)
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let candidates = geocoder
        .geocode("Wembley Stadium, London")
        .await
        .expect("should parse candidates");

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].raw["id"], "poi.8590");
    assert!((candidates[0].latitude - 51.556_021).abs() < 1e-12);
    assert!((candidates[0].longitude - -0.279_884).abs() < 1e-12);
    assert!((candidates[0].relevance - 0.98).abs() < 1e-12);
    assert_eq!(candidates[1].display_place_name, "Wembley, London, United Kingdom");
}

#[tokio::test]
async fn geocode_blank_address_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wembley_body()))
        .expect(0)
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let result = geocoder.geocode("   \t ").await;

    assert!(
        matches!(result, Err(GeocodeError::InvalidAddress)),
        "expected InvalidAddress, got: {result:?}"
    );
}

#[tokio::test]
async fn geocode_maps_429_to_rate_limited_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let result = geocoder.geocode("Wembley Stadium, London").await;

    assert!(
        matches!(
            result,
            Err(GeocodeError::RateLimited {
                retry_after_secs: Some(7)
            })
        ),
        "expected RateLimited(7), got: {result:?}"
    );
}

#[tokio::test]
async fn geocode_maps_server_error_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let result = geocoder.geocode("Wembley Stadium, London").await;

    assert!(
        matches!(result, Err(GeocodeError::UnexpectedStatus { status: 503 })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
}

#[tokio::test]
async fn geocode_maps_unauthorized_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Not Authorized"})))
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let result = geocoder.geocode("Leeds").await;

    assert!(matches!(
        result,
        Err(GeocodeError::UnexpectedStatus { status: 401 })
    ));
}

#[tokio::test]
async fn geocode_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let err = geocoder.geocode("Leeds").await.unwrap_err();

    assert!(err.is_malformed(), "expected malformed error, got: {err:?}");
}

#[tokio::test]
async fn geocode_wrong_shape_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let result = geocoder.geocode("Leeds").await;

    assert!(matches!(result, Err(GeocodeError::MalformedResponse(_))));
}

#[tokio::test]
async fn geocode_empty_feature_list_is_ok_and_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"type": "FeatureCollection", "features": []})),
        )
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    let candidates = geocoder.geocode("Nowhere In Particular").await.unwrap();

    assert!(candidates.is_empty());
}

#[tokio::test]
async fn geocode_sends_types_filter_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(PLACES_PATH))
        .and(query_param("types", "poi,address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wembley_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = GeocoderSettings::with_token("test-token");
    settings.base_url = server.uri();
    settings.types = Some("poi,address".to_owned());
    let geocoder = MapboxGeocoder::new(&settings).unwrap();

    let candidates = geocoder.geocode("Wembley Stadium, London").await.unwrap();
    assert_eq!(candidates.len(), 2);
}
