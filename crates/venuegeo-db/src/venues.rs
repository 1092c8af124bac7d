//! Database operations for the `venues` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use venuegeo_core::{Coordinates, LocationRecord, ReconcileScope, RecordId};

use crate::DbError;

/// A row from the `venues` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VenueRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub location_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geocoded_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VenueRow {
    /// Converts the row into the engine's record shape, keyed by `public_id`.
    #[must_use]
    pub fn into_record(self) -> LocationRecord {
        let current = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        LocationRecord {
            id: RecordId::new(self.public_id.to_string()),
            display_name: self.name,
            address_text: self.location_name,
            current,
        }
    }
}

/// List active venues, oldest first.
///
/// With [`ReconcileScope::MissingCoordinates`] only venues without a stored
/// coordinate pair are returned. Venues with a blank `location_name` are
/// included so the run can report them.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_venues(pool: &PgPool, scope: ReconcileScope) -> Result<Vec<VenueRow>, sqlx::Error> {
    let missing_only = matches!(scope, ReconcileScope::MissingCoordinates);

    sqlx::query_as::<_, VenueRow>(
        "SELECT id, public_id, name, location_name, latitude, longitude, \
                geocoded_at, is_active, created_at, updated_at \
         FROM venues \
         WHERE is_active = TRUE \
           AND ($1 = FALSE OR latitude IS NULL OR longitude IS NULL) \
         ORDER BY id ASC",
    )
    .bind(missing_only)
    .fetch_all(pool)
    .await
}

/// Replace the coordinate pair of one venue and stamp `geocoded_at`.
///
/// Both columns are written by a single `UPDATE`, so a pair is never
/// half-applied.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active venue has `public_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_venue_coordinates(
    pool: &PgPool,
    public_id: Uuid,
    coordinates: Coordinates,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE venues \
         SET latitude = $2, longitude = $3, geocoded_at = NOW(), updated_at = NOW() \
         WHERE public_id = $1 AND is_active = TRUE",
    )
    .bind(public_id)
    .bind(coordinates.latitude)
    .bind(coordinates.longitude)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
