pub mod app_config;
pub mod config;
pub mod location;
pub mod store;
pub mod venues;

pub use app_config::{AppConfig, Environment, DEFAULT_MIN_RELEVANCE};
pub use config::{load_app_config, load_app_config_from_env};
pub use location::{Coordinates, LocationRecord, RecordId};
pub use store::{ReconcileScope, RecordStore, StoreError};
pub use venues::{load_venues, VenueConfig, VenuesFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read venues file {path}: {source}")]
    VenuesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse venues file: {0}")]
    VenuesFileParse(#[from] serde_yaml::Error),

    #[error("venues validation failed: {0}")]
    Validation(String),
}
