//! Item facade.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde_json::json;
use tracing::debug;

use crate::core::{ArrayField, ArrayFieldOps, ArrayMatch, ItemStore};
use crate::error::StorageResult;
use crate::types::{
    build_report, threshold_date, ExpiryReport, Item, ItemFilter, ItemPatch, ItemQuery, ItemStats,
    LocationChoices, MoveRecord, RestoreMode,
};

use super::Dispatch;

/// Format of [`MoveRecord::date`].
pub const MOVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Operations on items, keyed by `ItemID`.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    dispatch: Arc<Dispatch>,
}

impl ItemRepository {
    pub(crate) fn new(dispatch: Arc<Dispatch>) -> Self {
        Self { dispatch }
    }

    pub async fn find_by_key(&self, item_id: &str) -> StorageResult<Option<Item>> {
        self.dispatch.backend()?.find_item(item_id).await
    }

    /// Inserts a new item.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the `ItemID` is taken.
    pub async fn insert(&self, item: &Item) -> StorageResult<()> {
        self.dispatch.backend()?.insert_item(item).await
    }

    /// Applies `patch`; returns false if the item does not exist.
    pub async fn update(&self, item_id: &str, patch: &ItemPatch) -> StorageResult<bool> {
        self.dispatch.backend()?.update_item(item_id, patch).await
    }

    pub async fn delete(&self, item_id: &str) -> StorageResult<bool> {
        self.dispatch.backend()?.delete_item(item_id).await
    }

    pub async fn list(&self, query: &ItemQuery) -> StorageResult<Vec<Item>> {
        self.dispatch.backend()?.list_items(query).await
    }

    pub async fn count(&self, filter: &ItemFilter) -> StorageResult<u64> {
        self.dispatch.backend()?.count_items(filter).await
    }

    /// Expired and near-expiry items relative to today's local date.
    pub async fn get_expiring(&self, days: u32) -> StorageResult<ExpiryReport> {
        self.get_expiring_on(Local::now().date_naive(), days).await
    }

    /// Expired and near-expiry items relative to `today`.
    pub async fn get_expiring_on(&self, today: NaiveDate, days: u32) -> StorageResult<ExpiryReport> {
        let until = threshold_date(today, days);
        let candidates = self.dispatch.backend()?.expiry_candidates(until).await?;
        Ok(build_report(candidates, today, days))
    }

    /// Flips `user_id`'s favorite mark and returns the new membership.
    ///
    /// A missing item reports `false`.
    pub async fn toggle_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool> {
        self.dispatch
            .backend()?
            .toggle_favorite(item_id, user_id)
            .await
    }

    pub async fn favorites_of(&self, user_id: &str) -> StorageResult<Vec<Item>> {
        self.dispatch.backend()?.favorites_of(user_id).await
    }

    pub async fn is_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool> {
        self.dispatch.backend()?.is_favorite(item_id, user_id).await
    }

    /// Links `other_id` to the item with a relation label.
    ///
    /// The same `(other_id, relation)` pair is never stored twice. Returns
    /// false if the item does not exist. The reverse link is the caller's.
    pub async fn add_related(
        &self,
        item_id: &str,
        other_id: &str,
        relation: &str,
    ) -> StorageResult<bool> {
        let link = json!({ "id": other_id, "type": relation });
        let outcome = self
            .dispatch
            .backend()?
            .add_unique(item_id, ArrayField::RelatedItems, link)
            .await?;
        Ok(outcome.found())
    }

    /// Drops every link to `other_id`, whatever its relation.
    pub async fn remove_related(&self, item_id: &str, other_id: &str) -> StorageResult<bool> {
        let outcome = self
            .dispatch
            .backend()?
            .remove(item_id, ArrayField::RelatedItems, &ArrayMatch::field("id", other_id))
            .await?;
        Ok(outcome.found())
    }

    /// Records a move stamped with the current local time.
    pub async fn append_move_history(&self, item_id: &str, from: &str, to: &str) -> StorageResult<bool> {
        let record = MoveRecord {
            date: Local::now().format(MOVE_DATE_FORMAT).to_string(),
            from_location: from.to_string(),
            to_location: to.to_string(),
        };
        let outcome = self
            .dispatch
            .backend()?
            .append_bounded(item_id, ArrayField::MoveHistory, serde_json::to_value(&record)?, None)
            .await?;
        Ok(outcome.found())
    }

    pub async fn stats(&self) -> StorageResult<ItemStats> {
        self.dispatch.backend()?.item_stats().await
    }

    /// Distinct floors, rooms and zones used by items.
    pub async fn location_choices(&self) -> StorageResult<LocationChoices> {
        self.dispatch.backend()?.location_choices().await
    }

    pub async fn get_all_for_backup(&self) -> StorageResult<Vec<Item>> {
        self.dispatch.backend()?.all_items().await
    }

    /// Writes `items` keyed by `ItemID` and returns how many were written.
    pub async fn restore(&self, items: &[Item], mode: RestoreMode) -> StorageResult<usize> {
        let backend = self.dispatch.backend()?;
        let mut written = 0;

        for item in items {
            match mode {
                RestoreMode::Merge => {
                    if !backend.replace_item(item).await? {
                        backend.insert_item(item).await?;
                    }
                }
                RestoreMode::Replace => {
                    backend.delete_item(&item.item_id).await?;
                    backend.insert_item(item).await?;
                }
            }
            written += 1;
        }

        debug!(written, mode = %mode, "restored items");
        Ok(written)
    }
}
