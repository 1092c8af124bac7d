use sqlx::PgPool;
use uuid::Uuid;
use venuegeo_core::VenueConfig;

use crate::DbError;

/// Upsert venues from the seed file, keyed by name.
///
/// Returns the number of venues processed (inserted or updated). All upserts
/// run inside a single transaction; if any fails the batch is rolled back.
///
/// Seeded coordinates only fill a venue that has none yet: coordinates
/// written by a reconciliation run are never overwritten by the seed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_venues(pool: &PgPool, venues: &[VenueConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for venue in venues {
        let coordinates = venue.coordinates();

        sqlx::query(
            "INSERT INTO venues (public_id, name, location_name, latitude, longitude, is_active) \
             VALUES ($1, $2, $3, $4, $5, TRUE) \
             ON CONFLICT (name) DO UPDATE SET \
                 location_name = EXCLUDED.location_name, \
                 latitude = COALESCE(venues.latitude, EXCLUDED.latitude), \
                 longitude = COALESCE(venues.longitude, EXCLUDED.longitude), \
                 is_active = TRUE, \
                 updated_at = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(venue.name.trim())
        .bind(&venue.location_name)
        .bind(coordinates.map(|c| c.latitude))
        .bind(coordinates.map(|c| c.longitude))
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::info!(count, "seeded venues");
    Ok(count)
}
