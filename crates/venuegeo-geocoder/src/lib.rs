pub mod candidate;
pub mod error;
pub mod mapbox;
pub mod provider;

pub use candidate::GeocodeCandidate;
pub use error::GeocodeError;
pub use mapbox::{GeocoderSettings, MapboxGeocoder};
pub use provider::GeocodeProvider;
