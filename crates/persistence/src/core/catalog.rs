//! Item type and location storage contracts.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{ItemType, Location, LocationPatch, NewLocation};

/// The de-duplicated set of item type names.
#[async_trait]
pub trait TypeStore: Send + Sync {
    /// Returns every type ordered by name.
    async fn list_types(&self) -> StorageResult<Vec<ItemType>>;

    /// Looks up a type by exact name.
    async fn find_type(&self, name: &str) -> StorageResult<Option<ItemType>>;

    /// Inserts a type and returns it with its id.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(DuplicateKey)` - if the name exists
    async fn insert_type(&self, name: &str) -> StorageResult<ItemType>;

    /// Deletes a type by name, returning whether it existed.
    async fn delete_type(&self, name: &str) -> StorageResult<bool>;
}

/// Storage locations, addressed by opaque id.
///
/// Ids that do not parse for the backend name no record.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Returns every location ordered by `order`, then insertion.
    async fn list_locations(&self) -> StorageResult<Vec<Location>>;

    /// Inserts a location and returns its id.
    async fn insert_location(&self, location: &NewLocation) -> StorageResult<String>;

    /// Applies the set fields of `patch`, returning whether the location existed.
    async fn update_location(&self, id: &str, patch: &LocationPatch) -> StorageResult<bool>;

    /// Sets only the display order.
    async fn reorder_location(&self, id: &str, order: i64) -> StorageResult<bool>;

    /// Deletes a location, returning whether it existed.
    async fn delete_location(&self, id: &str) -> StorageResult<bool>;
}
