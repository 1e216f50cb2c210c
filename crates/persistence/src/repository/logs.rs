//! Audit log facade.

use std::sync::Arc;

use crate::core::LogStore;
use crate::error::StorageResult;
use crate::types::{LogEntry, LogFilter};

use super::Dispatch;

/// Append-only audit log.
#[derive(Debug, Clone)]
pub struct LogRepository {
    dispatch: Arc<Dispatch>,
}

impl LogRepository {
    pub(crate) fn new(dispatch: Arc<Dispatch>) -> Self {
        Self { dispatch }
    }

    /// Stores an entry and returns its id.
    pub async fn append(&self, entry: &LogEntry) -> StorageResult<String> {
        self.dispatch.backend()?.append_log(entry).await
    }

    /// Entries newest first. A `limit` of zero returns everything after
    /// `skip`.
    pub async fn list(&self, filter: &LogFilter, limit: u64, skip: u64) -> StorageResult<Vec<LogEntry>> {
        self.dispatch.backend()?.list_logs(filter, limit, skip).await
    }

    pub async fn count(&self, filter: &LogFilter) -> StorageResult<u64> {
        self.dispatch.backend()?.count_logs(filter).await
    }

    /// The newest entries about one item.
    pub async fn for_item(&self, item_id: &str, limit: u64) -> StorageResult<Vec<LogEntry>> {
        self.list(&LogFilter::new().item_id(item_id), limit, 0).await
    }
}
