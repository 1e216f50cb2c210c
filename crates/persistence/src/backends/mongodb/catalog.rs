//! TypeStore and LocationStore implementations for MongoDB.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, Document};

use crate::core::{LocationStore, TypeStore};
use crate::error::{ResourceError, StorageError, StorageResult};
use crate::types::id::{from_object_id, to_object_id};
use crate::types::{ItemType, Location, LocationPatch, NewLocation};

use super::backend::{LOCATIONS, TYPES};
use super::query::{is_duplicate_key, normalize_id};
use super::MongoBackend;

fn to_type(mut doc: Document) -> StorageResult<ItemType> {
    normalize_id(&mut doc);
    Ok(from_document(doc)?)
}

fn to_location(mut doc: Document) -> StorageResult<Location> {
    normalize_id(&mut doc);
    Ok(from_document(doc)?)
}

fn inserted_id(result: &mongodb::results::InsertOneResult) -> String {
    match result.inserted_id.as_object_id() {
        Some(oid) => from_object_id(&oid),
        None => result.inserted_id.to_string(),
    }
}

#[async_trait]
impl TypeStore for MongoBackend {
    async fn list_types(&self) -> StorageResult<Vec<ItemType>> {
        let docs: Vec<Document> = self
            .collection(TYPES)
            .find(Document::new())
            .sort(doc! { "name": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        docs.into_iter().map(to_type).collect()
    }

    async fn find_type(&self, name: &str) -> StorageResult<Option<ItemType>> {
        self.collection(TYPES)
            .find_one(doc! { "name": name })
            .await?
            .map(to_type)
            .transpose()
    }

    async fn insert_type(&self, name: &str) -> StorageResult<ItemType> {
        let result = self
            .collection(TYPES)
            .insert_one(doc! { "name": name })
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    StorageError::Resource(ResourceError::DuplicateKey {
                        entity: "item type",
                        key: name.to_string(),
                    })
                } else {
                    e.into()
                }
            })?;

        Ok(ItemType {
            id: inserted_id(&result),
            name: name.to_string(),
        })
    }

    async fn delete_type(&self, name: &str) -> StorageResult<bool> {
        let result = self
            .collection(TYPES)
            .delete_one(doc! { "name": name })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl LocationStore for MongoBackend {
    async fn list_locations(&self) -> StorageResult<Vec<Location>> {
        let docs: Vec<Document> = self
            .collection(LOCATIONS)
            .find(Document::new())
            .sort(doc! { "order": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        docs.into_iter().map(to_location).collect()
    }

    async fn insert_location(&self, location: &NewLocation) -> StorageResult<String> {
        let result = self
            .collection(LOCATIONS)
            .insert_one(doc! {
                "floor": &location.floor,
                "room": &location.room,
                "zone": &location.zone,
                "order": location.order,
            })
            .await?;
        Ok(inserted_id(&result))
    }

    async fn update_location(&self, id: &str, patch: &LocationPatch) -> StorageResult<bool> {
        let Some(oid) = to_object_id(id) else {
            return Ok(false);
        };

        let mut set = Document::new();
        if let Some(floor) = &patch.floor {
            set.insert("floor", floor);
        }
        if let Some(room) = &patch.room {
            set.insert("room", room);
        }
        if let Some(zone) = &patch.zone {
            set.insert("zone", zone);
        }
        if let Some(order) = patch.order {
            set.insert("order", order);
        }

        let filter = doc! { "_id": oid };
        if set.is_empty() {
            return Ok(self.collection(LOCATIONS).count_documents(filter).await? > 0);
        }

        let result = self
            .collection(LOCATIONS)
            .update_one(filter, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn reorder_location(&self, id: &str, order: i64) -> StorageResult<bool> {
        let Some(oid) = to_object_id(id) else {
            return Ok(false);
        };
        let result = self
            .collection(LOCATIONS)
            .update_one(doc! { "_id": oid }, doc! { "$set": { "order": order } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_location(&self, id: &str) -> StorageResult<bool> {
        let Some(oid) = to_object_id(id) else {
            return Ok(false);
        };
        let result = self
            .collection(LOCATIONS)
            .delete_one(doc! { "_id": oid })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
