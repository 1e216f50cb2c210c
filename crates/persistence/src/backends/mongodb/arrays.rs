//! ArrayFieldOps for MongoDB, using native array operators.

use async_trait::async_trait;
use mongodb::bson::{doc, to_bson, Bson, Document};
use mongodb::Collection;
use serde_json::Value;

use crate::core::{ArrayField, ArrayFieldOps, ArrayMatch, ArrayUpdate};
use crate::error::StorageResult;

use super::query::{absent_element, pull_condition, to_i64};
use super::MongoBackend;

fn key_filter(key_field: &str, key: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(key_field, key);
    filter
}

async fn owner_exists(
    collection: &Collection<Document>,
    key_field: &str,
    key: &str,
) -> StorageResult<bool> {
    Ok(collection.count_documents(key_filter(key_field, key)).await? > 0)
}

#[async_trait]
impl ArrayFieldOps for MongoBackend {
    async fn add_unique(
        &self,
        key: &str,
        field: ArrayField,
        value: Value,
    ) -> StorageResult<ArrayUpdate> {
        let (collection, key_field) = self.owner_collection(field.owner());
        let element = to_bson(&value)?;

        let mut filter = key_filter(key_field, key);
        filter.extend(absent_element(field.name(), &element));

        let mut push = Document::new();
        push.insert(field.name(), element);
        let result = collection.update_one(filter, doc! { "$push": push }).await?;

        if result.modified_count > 0 {
            return Ok(ArrayUpdate::Changed);
        }
        // The filter failed either on the key or on the element check.
        Ok(if owner_exists(&collection, key_field, key).await? {
            ArrayUpdate::Unchanged
        } else {
            ArrayUpdate::NotFound
        })
    }

    async fn remove(
        &self,
        key: &str,
        field: ArrayField,
        selector: &ArrayMatch,
    ) -> StorageResult<ArrayUpdate> {
        let (collection, key_field) = self.owner_collection(field.owner());

        let mut pull = Document::new();
        pull.insert(field.name(), pull_condition(selector)?);
        let result = collection
            .update_one(key_filter(key_field, key), doc! { "$pull": pull })
            .await?;

        Ok(if result.modified_count > 0 {
            ArrayUpdate::Changed
        } else if result.matched_count > 0 {
            ArrayUpdate::Unchanged
        } else {
            ArrayUpdate::NotFound
        })
    }

    async fn append_bounded(
        &self,
        key: &str,
        field: ArrayField,
        value: Value,
        cap: Option<usize>,
    ) -> StorageResult<ArrayUpdate> {
        let (collection, key_field) = self.owner_collection(field.owner());

        let mut each = doc! { "$each": [to_bson(&value)?] };
        if let Some(cap) = cap {
            let cap = to_i64(cap as u64);
            each.insert("$slice", Bson::Int64(-cap));
        }
        let mut push = Document::new();
        push.insert(field.name(), each);

        let result = collection
            .update_one(key_filter(key_field, key), doc! { "$push": push })
            .await?;

        Ok(if result.matched_count > 0 {
            ArrayUpdate::Changed
        } else {
            ArrayUpdate::NotFound
        })
    }
}
