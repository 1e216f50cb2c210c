//! ItemStore implementation for MongoDB.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, to_document, Bson, Document};
use mongodb::options::ReturnDocument;

use crate::core::ItemStore;
use crate::error::{ResourceError, StorageError, StorageResult};
use crate::types::{
    Item, ItemFilter, ItemPatch, ItemQuery, ItemStats, LocationChoices, DATE_FORMAT,
};

use super::backend::ITEMS;
use super::query::{is_duplicate_key, item_filter, item_pipeline, item_set};
use super::MongoBackend;

fn to_items(docs: Vec<Document>) -> StorageResult<Vec<Item>> {
    docs.into_iter()
        .map(|doc| from_document::<Item>(doc).map_err(StorageError::from))
        .collect()
}

/// Aggregation expression for the favorites array, treating a missing field
/// as empty.
fn favorites_or_empty() -> Bson {
    Bson::Document(doc! { "$ifNull": ["$favorites", []] })
}

impl MongoBackend {
    async fn find_items(&self, filter: Document) -> StorageResult<Vec<Item>> {
        let docs: Vec<Document> = self
            .collection(ITEMS)
            .find(filter)
            .sort(doc! { "ItemID": 1 })
            .projection(doc! { "_id": 0 })
            .await?
            .try_collect()
            .await?;
        to_items(docs)
    }

    async fn distinct_values(&self, field: &str) -> StorageResult<Vec<String>> {
        let mut filter = Document::new();
        filter.insert(field, doc! { "$type": "string", "$ne": "" });
        let raw = self.collection(ITEMS).distinct(field, filter).await?;

        let mut values: Vec<String> = raw
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    async fn count_non_empty(&self, field: &str) -> StorageResult<u64> {
        let mut filter = Document::new();
        filter.insert(field, doc! { "$nin": ["", Bson::Null] });
        Ok(self.collection(ITEMS).count_documents(filter).await?)
    }
}

#[async_trait]
impl ItemStore for MongoBackend {
    async fn find_item(&self, item_id: &str) -> StorageResult<Option<Item>> {
        let doc = self
            .collection(ITEMS)
            .find_one(doc! { "ItemID": item_id })
            .projection(doc! { "_id": 0 })
            .await?;
        doc.map(|d| from_document::<Item>(d).map_err(StorageError::from))
            .transpose()
    }

    async fn insert_item(&self, item: &Item) -> StorageResult<()> {
        let doc = to_document(item)?;
        match self.collection(ITEMS).insert_one(doc).await {
            Ok(_) => {
                tracing::debug!(item_id = %item.item_id, "inserted item");
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => Err(StorageError::Resource(ResourceError::DuplicateKey {
                entity: "item",
                key: item.item_id.clone(),
            })),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_item(&self, item_id: &str, patch: &ItemPatch) -> StorageResult<bool> {
        let filter = doc! { "ItemID": item_id };
        if patch.is_empty() {
            return Ok(self.collection(ITEMS).count_documents(filter).await? > 0);
        }

        let result = self
            .collection(ITEMS)
            .update_one(filter, doc! { "$set": item_set(patch.changes()) })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn replace_item(&self, item: &Item) -> StorageResult<bool> {
        let result = self
            .collection(ITEMS)
            .replace_one(doc! { "ItemID": &item.item_id }, to_document(item)?)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_item(&self, item_id: &str) -> StorageResult<bool> {
        let result = self
            .collection(ITEMS)
            .delete_one(doc! { "ItemID": item_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_items(&self, query: &ItemQuery) -> StorageResult<Vec<Item>> {
        let docs: Vec<Document> = self
            .collection(ITEMS)
            .aggregate(item_pipeline(query))
            .await?
            .try_collect()
            .await?;
        to_items(docs)
    }

    async fn count_items(&self, filter: &ItemFilter) -> StorageResult<u64> {
        Ok(self
            .collection(ITEMS)
            .count_documents(item_filter(filter))
            .await?)
    }

    async fn expiry_candidates(&self, until: NaiveDate) -> StorageResult<Vec<Item>> {
        // Legacy documents may hold "" for a missing date.
        let bound = doc! { "$gt": "", "$lte": until.format(DATE_FORMAT).to_string() };
        self.find_items(doc! {
            "$or": [
                { "WarrantyExpiry": bound.clone() },
                { "UsageExpiry": bound },
            ]
        })
        .await
    }

    async fn toggle_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool> {
        let user = doc! { "$literal": user_id };
        let update = vec![doc! {
            "$set": {
                "favorites": {
                    "$cond": [
                        { "$in": [user.clone(), favorites_or_empty()] },
                        {
                            "$filter": {
                                "input": favorites_or_empty(),
                                "cond": { "$ne": ["$$this", user.clone()] }
                            }
                        },
                        { "$concatArrays": [favorites_or_empty(), [user]] }
                    ]
                }
            }
        }];

        let updated = self
            .collection(ITEMS)
            .find_one_and_update(doc! { "ItemID": item_id }, update)
            .projection(doc! { "_id": 0, "favorites": 1 })
            .return_document(ReturnDocument::After)
            .await?;

        Ok(match updated {
            Some(doc) => doc
                .get_array("favorites")
                .map(|favorites| favorites.iter().any(|f| f.as_str() == Some(user_id)))
                .unwrap_or(false),
            None => false,
        })
    }

    async fn favorites_of(&self, user_id: &str) -> StorageResult<Vec<Item>> {
        self.find_items(doc! { "favorites": user_id }).await
    }

    async fn is_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool> {
        let count = self
            .collection(ITEMS)
            .count_documents(doc! { "ItemID": item_id, "favorites": user_id })
            .await?;
        Ok(count > 0)
    }

    async fn all_items(&self) -> StorageResult<Vec<Item>> {
        self.find_items(Document::new()).await
    }

    async fn location_choices(&self) -> StorageResult<LocationChoices> {
        Ok(LocationChoices {
            floors: self.distinct_values("ItemFloor").await?,
            rooms: self.distinct_values("ItemRoom").await?,
            zones: self.distinct_values("ItemZone").await?,
        })
    }

    async fn item_stats(&self) -> StorageResult<ItemStats> {
        Ok(ItemStats {
            total: self.collection(ITEMS).count_documents(Document::new()).await?,
            with_photo: self.count_non_empty("ItemPic").await?,
            with_location: self.count_non_empty("ItemStorePlace").await?,
            with_type: self.count_non_empty("ItemType").await?,
        })
    }
}
