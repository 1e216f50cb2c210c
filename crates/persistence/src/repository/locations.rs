//! Location facade, cached.

use std::sync::Arc;

use crate::cache::list_key;
use crate::core::{BackendKind, LocationStore};
use crate::error::{StorageError, StorageResult};
use crate::types::{Location, LocationPatch, NewLocation, RestoreMode};

use super::Dispatch;

const AGGREGATE: &str = "locations";

/// Operations on storage locations.
///
/// Ids are backend-opaque; one that does not parse for the active backend
/// behaves like a missing record.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    dispatch: Arc<Dispatch>,
}

impl LocationRepository {
    pub(crate) fn new(dispatch: Arc<Dispatch>) -> Self {
        Self { dispatch }
    }

    /// All locations ordered by `order`, then id.
    pub async fn list_all(&self) -> StorageResult<Vec<Location>> {
        let (kind, backend) = self.dispatch.active()?;
        self.dispatch
            .cache()
            .get_or_load(&list_key(AGGREGATE, kind), || backend.list_locations())
            .await
    }

    /// Inserts a location and returns its id.
    pub async fn insert(&self, location: &NewLocation) -> StorageResult<String> {
        let (kind, backend) = self.dispatch.active()?;
        let result = backend.insert_location(location).await;
        self.evict(kind).await;
        result
    }

    pub async fn update(&self, id: &str, patch: &LocationPatch) -> StorageResult<bool> {
        let (kind, backend) = self.dispatch.active()?;
        let result = backend.update_location(id, patch).await;
        self.evict(kind).await;
        result
    }

    /// Sets the display position of one location.
    pub async fn reorder(&self, id: &str, order: i64) -> StorageResult<bool> {
        let (kind, backend) = self.dispatch.active()?;
        let result = backend.reorder_location(id, order).await;
        self.evict(kind).await;
        result
    }

    pub async fn delete(&self, id: &str) -> StorageResult<bool> {
        let (kind, backend) = self.dispatch.active()?;
        let result = backend.delete_location(id).await;
        self.evict(kind).await;
        result
    }

    pub async fn get_all_for_backup(&self) -> StorageResult<Vec<NewLocation>> {
        let (_, backend) = self.dispatch.active()?;
        Ok(backend
            .list_locations()
            .await?
            .iter()
            .map(Location::to_new)
            .collect())
    }

    /// Restores locations keyed by `(floor, room, zone)` and returns how
    /// many were written.
    pub async fn restore(&self, locations: &[NewLocation], mode: RestoreMode) -> StorageResult<usize> {
        let (kind, backend) = self.dispatch.active()?;

        let result = async {
            let mut existing = backend.list_locations().await?;
            let mut written = 0;

            for location in locations {
                let matches: Vec<String> = existing
                    .iter()
                    .filter(|l| l.has_key(&location.floor, &location.room, &location.zone))
                    .map(|l| l.id.clone())
                    .collect();

                match (mode, matches.first()) {
                    (RestoreMode::Merge, Some(id)) => {
                        let patch = LocationPatch {
                            order: Some(location.order),
                            ..Default::default()
                        };
                        backend.update_location(id, &patch).await?;
                    }
                    (RestoreMode::Merge, None) => {
                        let id = backend.insert_location(location).await?;
                        existing.push(stored(id, location));
                    }
                    (RestoreMode::Replace, _) => {
                        for id in &matches {
                            backend.delete_location(id).await?;
                        }
                        existing.retain(|l| !matches.contains(&l.id));
                        let id = backend.insert_location(location).await?;
                        existing.push(stored(id, location));
                    }
                }
                written += 1;
            }
            Ok::<_, StorageError>(written)
        }
        .await;

        self.evict(kind).await;
        result
    }

    async fn evict(&self, kind: BackendKind) {
        self.dispatch.cache().evict(&list_key(AGGREGATE, kind)).await;
    }
}

fn stored(id: String, location: &NewLocation) -> Location {
    Location {
        id,
        floor: location.floor.clone(),
        room: location.room.clone(),
        zone: location.zone.clone(),
        order: location.order,
    }
}
