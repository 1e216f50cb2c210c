//! UserStore implementation for MongoDB.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, to_document, Document};

use crate::core::UserStore;
use crate::error::{ResourceError, StorageError, StorageResult};
use crate::types::id::from_object_id;
use crate::types::{NotificationSettings, User};

use super::backend::USERS;
use super::query::{is_duplicate_key, normalize_id};
use super::MongoBackend;

fn to_user(mut doc: Document) -> StorageResult<User> {
    normalize_id(&mut doc);
    Ok(from_document(doc)?)
}

impl MongoBackend {
    async fn set_user_fields(&self, username: &str, set: Document) -> StorageResult<bool> {
        let result = self
            .collection(USERS)
            .update_one(doc! { "User": username }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoBackend {
    async fn find_user(&self, username: &str) -> StorageResult<Option<User>> {
        self.collection(USERS)
            .find_one(doc! { "User": username })
            .await?
            .map(to_user)
            .transpose()
    }

    async fn find_user_ci(&self, username: &str) -> StorageResult<Option<User>> {
        let pattern = format!("^{}$", regex::escape(username));
        let doc = self
            .collection(USERS)
            .find_one(doc! { "User": { "$regex": pattern, "$options": "i" } })
            .sort(doc! { "_id": 1 })
            .await?;
        doc.map(to_user).transpose()
    }

    async fn insert_user(&self, user: &User) -> StorageResult<String> {
        let mut doc = to_document(user)?;
        doc.remove("id");

        let result = self.collection(USERS).insert_one(doc).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StorageError::Resource(ResourceError::DuplicateKey {
                    entity: "user",
                    key: user.username.clone(),
                })
            } else {
                e.into()
            }
        })?;

        Ok(match result.inserted_id.as_object_id() {
            Some(oid) => from_object_id(&oid),
            None => result.inserted_id.to_string(),
        })
    }

    async fn update_credential(
        &self,
        username: &str,
        password_hash: &str,
        password_changed: bool,
    ) -> StorageResult<bool> {
        self.set_user_fields(
            username,
            doc! { "Password": password_hash, "password_changed": password_changed },
        )
        .await
    }

    async fn notification_settings(
        &self,
        username: &str,
    ) -> StorageResult<Option<NotificationSettings>> {
        self.collection(USERS)
            .find_one(doc! { "User": username })
            .projection(doc! { "_id": 0, "User": 0, "Password": 0, "login_history": 0 })
            .await?
            .map(|doc| from_document::<NotificationSettings>(doc).map_err(StorageError::from))
            .transpose()
    }

    async fn set_notification_settings(
        &self,
        username: &str,
        settings: &NotificationSettings,
    ) -> StorageResult<bool> {
        self.set_user_fields(username, to_document(settings)?).await
    }

    async fn touch_last_login(&self, username: &str, at: &str, ip: &str) -> StorageResult<bool> {
        self.set_user_fields(username, doc! { "last_login": at, "last_login_ip": ip })
            .await
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        // No collation: binary order, matching the relational adapter.
        let docs: Vec<Document> = self
            .collection(USERS)
            .find(Document::new())
            .sort(doc! { "User": 1 })
            .await?
            .try_collect()
            .await?;
        docs.into_iter().map(to_user).collect()
    }
}
