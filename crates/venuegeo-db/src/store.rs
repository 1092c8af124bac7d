//! [`RecordStore`] implementation backed by the `venues` table.

use sqlx::PgPool;
use uuid::Uuid;
use venuegeo_core::{Coordinates, LocationRecord, ReconcileScope, RecordId, RecordStore, StoreError};

use crate::venues::{list_venues, update_venue_coordinates};
use crate::DbError;

/// Postgres-backed record store. Record ids are venue `public_id` UUIDs.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RecordStore for PgRecordStore {
    async fn list_records(&self, scope: ReconcileScope) -> Result<Vec<LocationRecord>, StoreError> {
        let rows = list_venues(&self.pool, scope)
            .await
            .map_err(|e| StoreError::Unavailable(Box::new(e)))?;
        Ok(rows.into_iter().map(crate::venues::VenueRow::into_record).collect())
    }

    async fn write_coordinates(&self, id: &RecordId, coordinates: Coordinates) -> Result<(), StoreError> {
        // Ids that are not UUIDs cannot name a venue.
        let Ok(public_id) = Uuid::parse_str(id.as_str()) else {
            return Err(StoreError::NotFound(id.clone()));
        };

        match update_venue_coordinates(&self.pool, public_id, coordinates).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound) => Err(StoreError::NotFound(id.clone())),
            Err(e) => Err(StoreError::Unavailable(Box::new(e))),
        }
    }
}
