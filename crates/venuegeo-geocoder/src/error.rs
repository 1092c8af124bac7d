use thiserror::Error;

/// Errors returned by a forward-geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The address was empty or whitespace-only; no request was sent.
    #[error("address is empty")]
    InvalidAddress,

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status other than 429.
    #[error("unexpected HTTP status {status} from geocoder")]
    UnexpectedStatus { status: u16 },

    /// The provider asked us to slow down (HTTP 429).
    #[error("rate limited by geocoder (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The response body is not JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response is JSON but does not have the candidate shape.
    #[error("malformed geocoder response: {0}")]
    MalformedResponse(String),

    /// The configured base URL cannot have endpoint paths appended to it.
    #[error("invalid geocoder base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl GeocodeError {
    /// Returns `true` for the explicit throttling signal, the only
    /// condition the reconciliation engine retries.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GeocodeError::RateLimited { .. })
    }

    /// Returns `true` when the provider broke its response contract.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            GeocodeError::Deserialize { .. } | GeocodeError::MalformedResponse(_)
        )
    }
}
