use serde::Serialize;
use venuegeo_core::Coordinates;

/// One ranked match returned by a geocoding provider.
///
/// `raw` is the provider's payload for this match, kept verbatim for the
/// audit report; only the fields below are ever read out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeCandidate {
    pub display_place_name: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Provider ranking signal, normalised to `[0, 1]`.
    pub relevance: f64,
    pub raw: serde_json::Value,
}

impl GeocodeCandidate {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
