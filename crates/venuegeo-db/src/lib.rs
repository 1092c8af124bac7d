use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

pub mod seed;
pub mod store;
pub mod venues;

pub use seed::seed_venues;
pub use store::PgRecordStore;
pub use venues::{list_venues, update_venue_coordinates, VenueRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// `migrate!` resolves relative to this crate's manifest, so this is the
// workspace-level migrations directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const COUNT_APPLIED_MIGRATIONS: &str =
    "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true";

/// Connection pool sizing for the venues database.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    /// Takes the `VENUEGEO_DB_*` pool settings already parsed into `config`.
    #[must_use]
    pub fn from_app_config(config: &venuegeo_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens the venues database pool at `database_url`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if no connection can be opened within the
/// acquire timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Brings the `venues` schema up to date.
///
/// Returns how many migrations this call applied; zero when the schema was
/// already current.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if a migration fails or the
/// recorded history does not match the bundled files.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migration_count(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migration_count(pool).await;
    Ok(newly_applied(before, after))
}

// Zero on a fresh database, where the history table is not created yet.
async fn applied_migration_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(COUNT_APPLIED_MIGRATIONS)
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

fn newly_applied(before: i64, after: i64) -> usize {
    usize::try_from(after.saturating_sub(before)).unwrap_or(0)
}

/// Round-trips a trivial query through the pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if no connection answers.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// [`ping`] with the crate's error type, for the server's health route.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the database does not answer.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}
