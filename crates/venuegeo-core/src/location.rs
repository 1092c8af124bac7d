//! Venue records and coordinate pairs shared by every crate in the workspace.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Opaque, store-assigned identifier of a location record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A latitude/longitude pair in decimal degrees.
///
/// Values are carried at full `f64` precision end to end; nothing in the
/// pipeline rounds them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when both components are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in metres (haversine).
    #[must_use]
    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

/// A stored venue whose coordinates are reconciled against its address text.
///
/// `address_text` is the authoritative input; `current` is derived output
/// from a previous run (or manual entry) and may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub id: RecordId,
    pub display_name: String,
    pub address_text: String,
    pub current: Option<Coordinates>,
}

impl LocationRecord {
    /// Returns the address with surrounding whitespace removed, or `None`
    /// when nothing usable is left.
    #[must_use]
    pub fn usable_address(&self) -> Option<&str> {
        let trimmed = self.address_text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
