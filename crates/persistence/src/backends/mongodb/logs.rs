//! LogStore implementation for MongoDB.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, to_document, Document};

use crate::core::LogStore;
use crate::error::StorageResult;
use crate::types::id::from_object_id;
use crate::types::{LogEntry, LogFilter};

use super::backend::LOGS;
use super::query::{log_filter, normalize_id, to_i64};
use super::MongoBackend;

#[async_trait]
impl LogStore for MongoBackend {
    async fn append_log(&self, entry: &LogEntry) -> StorageResult<String> {
        let mut doc = to_document(entry)?;
        doc.remove("id");

        let result = self.collection(LOGS).insert_one(doc).await?;
        Ok(match result.inserted_id.as_object_id() {
            Some(oid) => from_object_id(&oid),
            None => result.inserted_id.to_string(),
        })
    }

    async fn list_logs(
        &self,
        filter: &LogFilter,
        limit: u64,
        skip: u64,
    ) -> StorageResult<Vec<LogEntry>> {
        let mut find = self
            .collection(LOGS)
            .find(log_filter(filter))
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(skip);
        if limit > 0 {
            find = find.limit(to_i64(limit));
        }

        let docs: Vec<Document> = find.await?.try_collect().await?;
        docs.into_iter()
            .map(|mut doc| {
                normalize_id(&mut doc);
                Ok(from_document::<LogEntry>(doc)?)
            })
            .collect()
    }

    async fn count_logs(&self, filter: &LogFilter) -> StorageResult<u64> {
        Ok(self
            .collection(LOGS)
            .count_documents(log_filter(filter))
            .await?)
    }
}
