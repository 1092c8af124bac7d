use std::net::SocketAddr;
use std::path::PathBuf;

/// Relevance a geocode candidate must reach before its coordinates are
/// written back. Overridden by `VENUEGEO_MIN_RELEVANCE`.
///
/// Mapbox scores an exact street or POI match at `1.0`; partial matches that
/// only agree on the city or region land well below `0.75`, so anything under
/// this line is reported as low confidence instead of moving a pin.
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub venues_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocoder_access_token: String,
    pub geocoder_base_url: String,
    pub geocoder_request_timeout_secs: u64,
    pub geocoder_user_agent: String,
    pub geocoder_result_limit: u32,
    pub geocoder_types: Option<String>,
    pub min_relevance: f64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub concurrency: usize,
    pub run_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("venues_path", &self.venues_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("geocoder_access_token", &"[redacted]")
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field(
                "geocoder_request_timeout_secs",
                &self.geocoder_request_timeout_secs,
            )
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("geocoder_result_limit", &self.geocoder_result_limit)
            .field("geocoder_types", &self.geocoder_types)
            .field("min_relevance", &self.min_relevance)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("concurrency", &self.concurrency)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .finish()
    }
}
