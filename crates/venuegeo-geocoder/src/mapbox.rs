//! HTTP adapter for the Mapbox `geocoding/v5` forward-geocoding endpoint.
//!
//! Wraps `reqwest` with status classification (429 vs. other non-2xx) and
//! turns each GeoJSON feature of the response into a [`GeocodeCandidate`],
//! keeping the feature object verbatim as the candidate's raw payload.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use venuegeo_core::{AppConfig, Coordinates};

use crate::candidate::GeocodeCandidate;
use crate::error::GeocodeError;
use crate::provider::GeocodeProvider;

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/";
const PLACES_ENDPOINT: [&str; 3] = ["geocoding", "v5", "mapbox.places"];
const REDACTED_TOKEN: &str = "redacted";

/// Connection and query settings for [`MapboxGeocoder`].
#[derive(Clone)]
pub struct GeocoderSettings {
    pub access_token: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Number of candidates requested per lookup (Mapbox allows 1–10).
    pub limit: u32,
    /// Optional comma-separated Mapbox `types` filter, e.g. `poi,address`.
    pub types: Option<String>,
}

impl GeocoderSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            access_token: config.geocoder_access_token.clone(),
            base_url: config.geocoder_base_url.clone(),
            timeout_secs: config.geocoder_request_timeout_secs,
            user_agent: config.geocoder_user_agent.clone(),
            limit: config.geocoder_result_limit,
            types: config.geocoder_types.clone(),
        }
    }

    /// Settings pointed at the production endpoint with default query options.
    #[must_use]
    pub fn with_token(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: 15,
            user_agent: "venuegeo/0.1 (geocode-reconcile)".to_owned(),
            limit: 5,
            types: None,
        }
    }
}

impl std::fmt::Debug for GeocoderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderSettings")
            .field("access_token", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("limit", &self.limit)
            .field("types", &self.types)
            .finish()
    }
}

/// Client for Mapbox forward geocoding.
///
/// Use [`GeocoderSettings::base_url`] to point it at a mock server in tests.
pub struct MapboxGeocoder {
    client: Client,
    base_url: Url,
    access_token: String,
    limit: u32,
    types: Option<String>,
}

/// The three fields a feature must carry to become a candidate.
#[derive(Debug, Deserialize)]
struct FeatureFields {
    place_name: String,
    center: Vec<f64>,
    relevance: f64,
}

impl MapboxGeocoder {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` is not a usable base URL.
    pub fn new(settings: &GeocoderSettings) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        // Exactly one trailing slash so the endpoint segments are appended
        // rather than replacing the last path segment.
        let normalised = format!("{}/", settings.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| GeocodeError::InvalidBaseUrl(settings.base_url.clone()))?;

        Ok(Self {
            client,
            base_url,
            access_token: settings.access_token.clone(),
            limit: settings.limit,
            types: settings.types.clone(),
        })
    }

    /// Builds the forward-geocoding URL for `address`, percent-encoding the
    /// address as a single path segment.
    fn build_url(&self, address: &str, access_token: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(PLACES_ENDPOINT)
                .push(&format!("{address}.json"));
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("access_token", access_token);
            pairs.append_pair("autocomplete", "false");
            pairs.append_pair("limit", &self.limit.to_string());
            if let Some(types) = &self.types {
                pairs.append_pair("types", types);
            }
        }
        url
    }

    /// Sends the request and classifies the HTTP status.
    async fn request_json(&self, url: Url) -> Result<serde_json::Value, GeocodeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(GeocodeError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: "mapbox places response".to_owned(),
            source: e,
        })
    }
}

impl GeocodeProvider for MapboxGeocoder {
    fn describe_request(&self, address_text: &str) -> String {
        format!(
            "GET {}",
            self.build_url(address_text.trim(), REDACTED_TOKEN)
        )
    }

    async fn geocode(&self, address_text: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let address = address_text.trim();
        if address.is_empty() {
            return Err(GeocodeError::InvalidAddress);
        }

        let url = self.build_url(address, &self.access_token);
        let body = self.request_json(url).await?;
        let candidates = parse_features(body)?;

        tracing::debug!(
            address,
            candidates = candidates.len(),
            "geocoder returned candidates"
        );
        Ok(candidates)
    }
}

/// Converts a Mapbox `FeatureCollection` into candidates, preserving order.
///
/// # Errors
///
/// Returns [`GeocodeError::MalformedResponse`] if `features` is missing or
/// any feature lacks a place name, a `[lon, lat]` center inside WGS84 range,
/// or a numeric relevance.
fn parse_features(body: serde_json::Value) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    let serde_json::Value::Object(mut envelope) = body else {
        return Err(GeocodeError::MalformedResponse(
            "response is not a JSON object".to_owned(),
        ));
    };

    let Some(serde_json::Value::Array(features)) = envelope.remove("features") else {
        return Err(GeocodeError::MalformedResponse(
            "response has no `features` array".to_owned(),
        ));
    };

    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let fields = FeatureFields::deserialize(&feature).map_err(|e| {
                GeocodeError::MalformedResponse(format!("feature {index}: {e}"))
            })?;

            let [longitude, latitude] = fields.center[..] else {
                return Err(GeocodeError::MalformedResponse(format!(
                    "feature {index}: center must be [lon, lat], got {} values",
                    fields.center.len()
                )));
            };

            if !Coordinates::new(latitude, longitude).is_valid() {
                return Err(GeocodeError::MalformedResponse(format!(
                    "feature {index}: center ({longitude}, {latitude}) is out of range"
                )));
            }

            if !fields.relevance.is_finite() {
                return Err(GeocodeError::MalformedResponse(format!(
                    "feature {index}: relevance is not a finite number"
                )));
            }

            Ok(GeocodeCandidate {
                display_place_name: fields.place_name,
                longitude,
                latitude,
                relevance: fields.relevance.clamp(0.0, 1.0),
                raw: feature,
            })
        })
        .collect()
}
