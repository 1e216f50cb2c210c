//! ArrayFieldOps for SQLite.
//!
//! Array fields live in JSON text columns. Every mutation reads the column,
//! edits it in memory and writes it back inside an immediate transaction, so
//! concurrent writers serialize on the database lock.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use serde_json::Value;

use crate::core::{element_matches, ArrayField, ArrayFieldOps, ArrayMatch, ArrayOwner, ArrayUpdate};
use crate::error::StorageResult;

use super::backend::internal_error;
use super::items::json_column;
use super::SqliteBackend;

/// Table and key column holding `field`.
fn location(field: ArrayField) -> (&'static str, &'static str) {
    match field.owner() {
        ArrayOwner::Item => ("items", "item_id"),
        ArrayOwner::User => ("users", "username"),
    }
}

impl SqliteBackend {
    /// Runs `edit` on the array in one immediate transaction.
    ///
    /// `edit` returns whether it changed the array; unchanged arrays are not
    /// written back.
    fn edit_array<F>(&self, key: &str, field: ArrayField, edit: F) -> StorageResult<ArrayUpdate>
    where
        F: FnOnce(&mut Vec<Value>) -> bool,
    {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let Some(mut elements) = read_array(&tx, key, field)? else {
            return Ok(ArrayUpdate::NotFound);
        };

        if !edit(&mut elements) {
            return Ok(ArrayUpdate::Unchanged);
        }

        let (table, key_column) = location(field);
        tx.execute(
            &format!("UPDATE {table} SET {field} = ?2 WHERE {key_column} = ?1"),
            params![key, serde_json::to_string(&elements)?],
        )
        .map_err(|e| internal_error(format!("Failed to write {}: {}", field, e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(ArrayUpdate::Changed)
    }
}

fn read_array(tx: &Transaction<'_>, key: &str, field: ArrayField) -> StorageResult<Option<Vec<Value>>> {
    let (table, key_column) = location(field);
    tx.query_row(
        &format!("SELECT {field} FROM {table} WHERE {key_column} = ?1"),
        [key],
        |row| json_column(row, 0),
    )
    .optional()
    .map_err(|e| internal_error(format!("Failed to read {}: {}", field, e)))
}

#[async_trait]
impl ArrayFieldOps for SqliteBackend {
    async fn add_unique(
        &self,
        key: &str,
        field: ArrayField,
        value: Value,
    ) -> StorageResult<ArrayUpdate> {
        self.edit_array(key, field, |elements| {
            if elements.iter().any(|e| element_matches(e, &value)) {
                return false;
            }
            elements.push(value);
            true
        })
    }

    async fn remove(
        &self,
        key: &str,
        field: ArrayField,
        selector: &ArrayMatch,
    ) -> StorageResult<ArrayUpdate> {
        self.edit_array(key, field, |elements| {
            let before = elements.len();
            elements.retain(|e| !selector.matches(e));
            elements.len() != before
        })
    }

    async fn append_bounded(
        &self,
        key: &str,
        field: ArrayField,
        value: Value,
        cap: Option<usize>,
    ) -> StorageResult<ArrayUpdate> {
        self.edit_array(key, field, |elements| {
            elements.push(value);
            if let Some(cap) = cap {
                let excess = elements.len().saturating_sub(cap);
                elements.drain(..excess);
            }
            true
        })
    }
}
