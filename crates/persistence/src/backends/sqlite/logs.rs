//! LogStore implementation for SQLite.

use async_trait::async_trait;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Row};

use crate::core::LogStore;
use crate::error::StorageResult;
use crate::types::id::from_row_id;
use crate::types::{timestamp, LogEntry, LogFilter};

use super::backend::{internal_error, sql_limit, sql_offset};
use super::items::json_column;
use super::SqliteBackend;

fn row_to_log(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    let created_at: String = row.get(6)?;
    Ok(LogEntry {
        id: from_row_id(row.get(0)?),
        action: row.get(1)?,
        user: row.get(2)?,
        item_id: row.get(3)?,
        item_name: row.get(4)?,
        details: json_column(row, 5)?,
        created_at: timestamp::parse(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
    })
}

fn filter_clause(filter: &LogFilter) -> (String, Vec<Value>) {
    let predicates = filter.predicates();
    if predicates.is_empty() {
        return ("1 = 1".to_string(), Vec::new());
    }

    let conditions: Vec<String> = predicates
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect();
    let values = predicates
        .iter()
        .map(|(_, value)| Value::Text(value.to_string()))
        .collect();
    (conditions.join(" AND "), values)
}

#[async_trait]
impl LogStore for SqliteBackend {
    async fn append_log(&self, entry: &LogEntry) -> StorageResult<String> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        tx.execute(
            "INSERT INTO logs (action, user, item_id, item_name, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.action,
                entry.user,
                entry.item_id,
                entry.item_name,
                serde_json::to_string(&entry.details)?,
                timestamp::format(&entry.created_at),
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert log: {}", e)))?;
        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(from_row_id(id))
    }

    async fn list_logs(
        &self,
        filter: &LogFilter,
        limit: u64,
        skip: u64,
    ) -> StorageResult<Vec<LogEntry>> {
        let (condition, mut values) = filter_clause(filter);
        let limit_param = values.len() + 1;
        let sql = format!(
            "SELECT id, action, user, item_id, item_name, details, created_at FROM logs
             WHERE {condition}
             ORDER BY created_at DESC, id DESC
             LIMIT ?{limit_param} OFFSET ?{}",
            limit_param + 1
        );
        values.push(Value::Integer(sql_limit(limit)));
        values.push(Value::Integer(sql_offset(skip)));

        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare log query: {}", e)))?;
        let entries = stmt
            .query_map(params_from_iter(values), row_to_log)
            .map_err(|e| internal_error(format!("Failed to query logs: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read log row: {}", e)))?;
        Ok(entries)
    }

    async fn count_logs(&self, filter: &LogFilter) -> StorageResult<u64> {
        let (condition, values) = filter_clause(filter);
        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM logs WHERE {condition}"),
                params_from_iter(values),
                |row| row.get(0),
            )
            .map_err(|e| internal_error(format!("Failed to count logs: {}", e)))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
