//! TypeStore and LocationStore implementations for SQLite.

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::core::{LocationStore, TypeStore};
use crate::error::StorageResult;
use crate::types::id::{from_row_id, to_row_id};
use crate::types::{ItemType, Location, LocationPatch, NewLocation};

use super::backend::{internal_error, write_error};
use super::SqliteBackend;

fn row_to_type(row: &Row<'_>) -> rusqlite::Result<ItemType> {
    Ok(ItemType {
        id: from_row_id(row.get(0)?),
        name: row.get(1)?,
    })
}

fn row_to_location(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: from_row_id(row.get(0)?),
        floor: row.get(1)?,
        room: row.get(2)?,
        zone: row.get(3)?,
        order: row.get(4)?,
    })
}

impl SqliteBackend {
    /// Executes one statement in its own transaction and returns the number
    /// of affected rows.
    fn execute_committed(&self, sql: &str, values: Vec<Value>, context: &str) -> StorageResult<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        let affected = tx
            .execute(sql, params_from_iter(values))
            .map_err(|e| internal_error(format!("{}: {}", context, e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;
        Ok(affected)
    }
}

#[async_trait]
impl TypeStore for SqliteBackend {
    async fn list_types(&self) -> StorageResult<Vec<ItemType>> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name FROM item_types ORDER BY name ASC, id ASC")
            .map_err(|e| internal_error(format!("Failed to prepare type query: {}", e)))?;
        let types = stmt
            .query_map([], row_to_type)
            .map_err(|e| internal_error(format!("Failed to query types: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read type row: {}", e)))?;
        Ok(types)
    }

    async fn find_type(&self, name: &str) -> StorageResult<Option<ItemType>> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT id, name FROM item_types WHERE name = ?1",
            [name],
            row_to_type,
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to read type: {}", e)))
    }

    async fn insert_type(&self, name: &str) -> StorageResult<ItemType> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        tx.execute("INSERT INTO item_types (name) VALUES (?1)", [name])
            .map_err(|e| write_error(e, "item type", name, "Failed to insert type"))?;
        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(ItemType {
            id: from_row_id(id),
            name: name.to_string(),
        })
    }

    async fn delete_type(&self, name: &str) -> StorageResult<bool> {
        let affected = self.execute_committed(
            "DELETE FROM item_types WHERE name = ?1",
            vec![Value::Text(name.to_string())],
            "Failed to delete type",
        )?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl LocationStore for SqliteBackend {
    async fn list_locations(&self) -> StorageResult<Vec<Location>> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, floor, room, zone, sort_order FROM locations
                 ORDER BY sort_order ASC, id ASC",
            )
            .map_err(|e| internal_error(format!("Failed to prepare location query: {}", e)))?;
        let locations = stmt
            .query_map([], row_to_location)
            .map_err(|e| internal_error(format!("Failed to query locations: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read location row: {}", e)))?;
        Ok(locations)
    }

    async fn insert_location(&self, location: &NewLocation) -> StorageResult<String> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        tx.execute(
            "INSERT INTO locations (floor, room, zone, sort_order) VALUES (?1, ?2, ?3, ?4)",
            params![location.floor, location.room, location.zone, location.order],
        )
        .map_err(|e| internal_error(format!("Failed to insert location: {}", e)))?;
        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(from_row_id(id))
    }

    async fn update_location(&self, id: &str, patch: &LocationPatch) -> StorageResult<bool> {
        let Some(row_id) = to_row_id(id) else {
            return Ok(false);
        };

        let mut assignments = Vec::new();
        let mut values = vec![Value::Integer(row_id)];
        let text_fields = [
            ("floor", &patch.floor),
            ("room", &patch.room),
            ("zone", &patch.zone),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                assignments.push(format!("{column} = ?{}", values.len() + 1));
                values.push(Value::Text(value.clone()));
            }
        }
        if let Some(order) = patch.order {
            assignments.push(format!("sort_order = ?{}", values.len() + 1));
            values.push(Value::Integer(order));
        }

        // An empty patch still reports whether the row exists.
        let sql = if assignments.is_empty() {
            "UPDATE locations SET id = id WHERE id = ?1".to_string()
        } else {
            format!("UPDATE locations SET {} WHERE id = ?1", assignments.join(", "))
        };

        let affected = self.execute_committed(&sql, values, "Failed to update location")?;
        Ok(affected > 0)
    }

    async fn reorder_location(&self, id: &str, order: i64) -> StorageResult<bool> {
        let Some(row_id) = to_row_id(id) else {
            return Ok(false);
        };
        let affected = self.execute_committed(
            "UPDATE locations SET sort_order = ?2 WHERE id = ?1",
            vec![Value::Integer(row_id), Value::Integer(order)],
            "Failed to reorder location",
        )?;
        Ok(affected > 0)
    }

    async fn delete_location(&self, id: &str) -> StorageResult<bool> {
        let Some(row_id) = to_row_id(id) else {
            return Ok(false);
        };
        let affected = self.execute_committed(
            "DELETE FROM locations WHERE id = ?1",
            vec![Value::Integer(row_id)],
            "Failed to delete location",
        )?;
        Ok(affected > 0)
    }
}
