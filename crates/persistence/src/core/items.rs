//! Item storage contract.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StorageResult;
use crate::types::{Item, ItemFilter, ItemPatch, ItemQuery, ItemStats, LocationChoices};

/// Item operations every adapter implements with identical semantics.
///
/// Items are addressed by their business key `ItemID`. Absence is never an
/// error: lookups return `None` and mutations return `false`.
///
/// # Example
///
/// ```ignore
/// use larder_persistence::core::ItemStore;
/// use larder_persistence::types::{Item, ItemPatch};
///
/// async fn example<S: ItemStore>(store: &S) -> StorageResult<()> {
///     store.insert_item(&Item::new("A1", "Notebook")).await?;
///     assert!(store.update_item("A1", &ItemPatch::new().quantity(3)).await?);
///     assert!(store.delete_item("A1").await?);
///     assert!(!store.delete_item("A1").await?);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Looks up an item by `ItemID`.
    async fn find_item(&self, item_id: &str) -> StorageResult<Option<Item>>;

    /// Inserts a new item.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(DuplicateKey)` - if the `ItemID` exists,
    ///   detected by the store's unique index
    async fn insert_item(&self, item: &Item) -> StorageResult<()>;

    /// Changes only the fields set in `patch`.
    ///
    /// Returns whether the item existed. An empty patch only checks existence.
    async fn update_item(&self, item_id: &str, patch: &ItemPatch) -> StorageResult<bool>;

    /// Overwrites every field of the item with the same `ItemID`.
    ///
    /// Returns whether the item existed.
    async fn replace_item(&self, item: &Item) -> StorageResult<bool>;

    /// Deletes an item, returning whether it existed.
    async fn delete_item(&self, item_id: &str) -> StorageResult<bool>;

    /// Returns a filtered, sorted page of items.
    ///
    /// See [`crate::types::ItemQuery`] for the ordering and pagination rules.
    async fn list_items(&self, query: &ItemQuery) -> StorageResult<Vec<Item>>;

    /// Counts items matching `filter`.
    async fn count_items(&self, filter: &ItemFilter) -> StorageResult<u64>;

    /// Returns items with any expiry date on or before `until`.
    ///
    /// Classification into expired and near-expiry happens above the adapter.
    async fn expiry_candidates(&self, until: NaiveDate) -> StorageResult<Vec<Item>>;

    /// Adds or removes `user_id` in the item's favorites as one atomic step.
    ///
    /// Returns the new membership; `false` if the item does not exist.
    async fn toggle_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool>;

    /// Returns the items `user_id` has favorited, in `ItemID` order.
    async fn favorites_of(&self, user_id: &str) -> StorageResult<Vec<Item>>;

    /// Returns whether `user_id` has favorited the item.
    async fn is_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool>;

    /// Returns every item in `ItemID` order.
    async fn all_items(&self) -> StorageResult<Vec<Item>>;

    /// Returns the distinct non-empty floors, rooms and zones used by items.
    async fn location_choices(&self) -> StorageResult<LocationChoices>;

    /// Returns dashboard counts.
    async fn item_stats(&self) -> StorageResult<ItemStats>;
}
