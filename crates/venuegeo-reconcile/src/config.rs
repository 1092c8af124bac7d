use venuegeo_core::{AppConfig, DEFAULT_MIN_RELEVANCE};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_BASE_MS: u64 = 1_000;
const DEFAULT_CONCURRENCY: usize = 4;

/// Knobs the reconciliation engine reads. Passed explicitly into every run;
/// the engine never consults the process environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileConfig {
    /// Minimum candidate relevance for coordinates to be written.
    pub min_relevance: f64,
    /// Additional provider attempts after a rate-limited response.
    pub max_retries: u32,
    /// Base delay for exponential backoff between rate-limited attempts.
    pub retry_backoff_base_ms: u64,
    /// Number of records processed concurrently.
    pub concurrency: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            min_relevance: DEFAULT_MIN_RELEVANCE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_base_ms: DEFAULT_RETRY_BACKOFF_BASE_MS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ReconcileConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_relevance: config.min_relevance,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            concurrency: config.concurrency.max(1),
        }
    }
}
