//! Audit log storage contract.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{LogEntry, LogFilter};

/// Append-only audit log. Entries are never updated or deleted here.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Stores an entry and returns its id. The entry's own `id` is ignored.
    async fn append_log(&self, entry: &LogEntry) -> StorageResult<String>;

    /// Returns entries newest first; ties go to the later insert.
    ///
    /// `limit` of zero means no limit.
    async fn list_logs(&self, filter: &LogFilter, limit: u64, skip: u64)
    -> StorageResult<Vec<LogEntry>>;

    async fn count_logs(&self, filter: &LogFilter) -> StorageResult<u64>;
}
