use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::location::Coordinates;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    pub location_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl VenueConfig {
    /// Returns the configured coordinate pair when both halves are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VenuesFile {
    pub venues: Vec<VenueConfig>,
}

/// Load and validate the venue seed list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_venues(path: &Path) -> Result<VenuesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::VenuesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let venues_file: VenuesFile = serde_yaml::from_str(&content)?;

    validate_venues(&venues_file)?;

    Ok(venues_file)
}

fn validate_venues(venues_file: &VenuesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for venue in &venues_file.venues {
        if venue.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "venue name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(venue.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate venue name: '{}'",
                venue.name
            )));
        }

        if venue.latitude.is_some() != venue.longitude.is_some() {
            return Err(ConfigError::Validation(format!(
                "venue '{}' must set both latitude and longitude or neither",
                venue.name
            )));
        }

        if let Some(coords) = venue.coordinates() {
            if !coords.is_valid() {
                return Err(ConfigError::Validation(format!(
                    "venue '{}' has out-of-range coordinates ({}, {})",
                    venue.name, coords.latitude, coords.longitude
                )));
            }
        }
    }

    Ok(())
}
