//! ItemStore implementation for SQLite.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;

use crate::core::ItemStore;
use crate::error::StorageResult;
use crate::types::{
    FieldValue, Item, ItemFilter, ItemPatch, ItemQuery, ItemSort, ItemStats, LocationChoices,
    MatchKind, SortDirection, DATE_FORMAT,
};

use super::backend::{internal_error, sql_limit, sql_offset, write_error, FOLD_FN};
use super::SqliteBackend;

/// Item columns in the order [`row_to_item`] and [`item_values`] use.
const ITEM_COLUMNS: [&str; 21] = [
    "item_id",
    "name",
    "description",
    "photo",
    "thumbnail",
    "photos",
    "store_place",
    "item_type",
    "owner",
    "acquired",
    "floor",
    "room",
    "zone",
    "warranty_expiry",
    "usage_expiry",
    "quantity",
    "safety_stock",
    "reorder_level",
    "move_history",
    "favorites",
    "related_items",
];

fn select_items() -> String {
    format!("SELECT {} FROM items", ITEM_COLUMNS.join(", "))
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        item_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        photo: row.get(3)?,
        thumbnail: row.get(4)?,
        photos: json_column(row, 5)?,
        store_place: row.get(6)?,
        item_type: row.get(7)?,
        owner: row.get(8)?,
        acquired: row.get(9)?,
        floor: row.get(10)?,
        room: row.get(11)?,
        zone: row.get(12)?,
        warranty_expiry: date_column(row, 13)?,
        usage_expiry: date_column(row, 14)?,
        quantity: row.get(15)?,
        safety_stock: row.get(16)?,
        reorder_level: row.get(17)?,
        move_history: json_column(row, 18)?,
        favorites: json_column(row, 19)?,
        related_items: json_column(row, 20)?,
    })
}

fn date_value(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        None => Value::Null,
    }
}

/// Values for every column in [`ITEM_COLUMNS`] order.
fn item_values(item: &Item) -> StorageResult<Vec<Value>> {
    Ok(vec![
        Value::Text(item.item_id.clone()),
        Value::Text(item.name.clone()),
        Value::Text(item.description.clone()),
        Value::Text(item.photo.clone()),
        Value::Text(item.thumbnail.clone()),
        Value::Text(serde_json::to_string(&item.photos)?),
        Value::Text(item.store_place.clone()),
        Value::Text(item.item_type.clone()),
        Value::Text(item.owner.clone()),
        Value::Text(item.acquired.clone()),
        Value::Text(item.floor.clone()),
        Value::Text(item.room.clone()),
        Value::Text(item.zone.clone()),
        date_value(item.warranty_expiry),
        date_value(item.usage_expiry),
        Value::Integer(i64::from(item.quantity)),
        Value::Integer(i64::from(item.safety_stock)),
        Value::Integer(i64::from(item.reorder_level)),
        Value::Text(serde_json::to_string(&item.move_history)?),
        Value::Text(serde_json::to_string(&item.favorites)?),
        Value::Text(serde_json::to_string(&item.related_items)?),
    ])
}

fn field_value(value: &FieldValue) -> StorageResult<Value> {
    Ok(match value {
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::TextList(list) => Value::Text(serde_json::to_string(list)?),
        FieldValue::Date(date) => date_value(*date),
        FieldValue::Count(n) => Value::Integer(i64::from(*n)),
    })
}

/// Builds a `WHERE` clause; placeholders are numbered from `first_param`.
fn filter_clause(filter: &ItemFilter, first_param: usize) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    for (field, kind, value) in filter.predicates() {
        let n = first_param + values.len();
        let column = field.column();
        conditions.push(match kind {
            MatchKind::Exact => format!("{column} = ?{n}"),
            MatchKind::ContainsIgnoreCase => {
                format!("instr({FOLD_FN}({column}), {FOLD_FN}(?{n})) > 0")
            }
        });
        values.push(Value::Text(value.to_string()));
    }

    if conditions.is_empty() {
        ("1 = 1".to_string(), values)
    } else {
        (conditions.join(" AND "), values)
    }
}

/// Missing values sort last in both directions, ties by `item_id`.
fn order_clause(sort: Option<&ItemSort>) -> String {
    match sort {
        None => "ORDER BY item_id ASC".to_string(),
        Some(sort) => {
            let column = sort.field.field().column();
            let direction = match sort.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            format!("ORDER BY ({column} IS NULL) ASC, {column} {direction}, item_id ASC")
        }
    }
}

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

impl SqliteBackend {
    fn query_items(&self, sql: &str, values: Vec<Value>) -> StorageResult<Vec<Item>> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| internal_error(format!("Failed to prepare item query: {}", e)))?;
        let items = stmt
            .query_map(params_from_iter(values), row_to_item)
            .map_err(|e| internal_error(format!("Failed to query items: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read item row: {}", e)))?;
        Ok(items)
    }

    fn distinct_values(&self, column: &str) -> StorageResult<Vec<String>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT DISTINCT {column} FROM items WHERE {column} <> '' ORDER BY {column}"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare distinct query: {}", e)))?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| internal_error(format!("Failed to query distinct {}: {}", column, e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read distinct {}: {}", column, e)))?;
        Ok(values)
    }
}

#[async_trait]
impl ItemStore for SqliteBackend {
    async fn find_item(&self, item_id: &str) -> StorageResult<Option<Item>> {
        let conn = self.get_connection()?;
        let sql = format!("{} WHERE item_id = ?1", select_items());
        conn.query_row(&sql, [item_id], row_to_item)
            .optional()
            .map_err(|e| internal_error(format!("Failed to read item: {}", e)))
    }

    async fn insert_item(&self, item: &Item) -> StorageResult<()> {
        let values = item_values(item)?;
        let placeholders: Vec<String> = (1..=ITEM_COLUMNS.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO items ({}) VALUES ({})",
            ITEM_COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        tx.execute(&sql, params_from_iter(values))
            .map_err(|e| write_error(e, "item", &item.item_id, "Failed to insert item"))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        tracing::debug!(item_id = %item.item_id, "inserted item");
        Ok(())
    }

    async fn update_item(&self, item_id: &str, patch: &ItemPatch) -> StorageResult<bool> {
        if patch.is_empty() {
            return Ok(self.find_item(item_id).await?.is_some());
        }

        let mut assignments = Vec::new();
        let mut values = vec![Value::Text(item_id.to_string())];
        for (field, value) in patch.changes() {
            assignments.push(format!("{} = ?{}", field.column(), values.len() + 1));
            values.push(field_value(value)?);
        }
        let sql = format!(
            "UPDATE items SET {} WHERE item_id = ?1",
            assignments.join(", ")
        );

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        let affected = tx
            .execute(&sql, params_from_iter(values))
            .map_err(|e| internal_error(format!("Failed to update item: {}", e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(affected > 0)
    }

    async fn replace_item(&self, item: &Item) -> StorageResult<bool> {
        let values = item_values(item)?;
        let assignments: Vec<String> = ITEM_COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE items SET {} WHERE item_id = ?1",
            assignments.join(", ")
        );

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        let affected = tx
            .execute(&sql, params_from_iter(values))
            .map_err(|e| internal_error(format!("Failed to replace item: {}", e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(affected > 0)
    }

    async fn delete_item(&self, item_id: &str) -> StorageResult<bool> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        let affected = tx
            .execute("DELETE FROM items WHERE item_id = ?1", [item_id])
            .map_err(|e| internal_error(format!("Failed to delete item: {}", e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(affected > 0)
    }

    async fn list_items(&self, query: &ItemQuery) -> StorageResult<Vec<Item>> {
        let (condition, mut values) = filter_clause(&query.filter, 1);
        let limit_param = values.len() + 1;
        let sql = format!(
            "{} WHERE {} {} LIMIT ?{} OFFSET ?{}",
            select_items(),
            condition,
            order_clause(query.sort.as_ref()),
            limit_param,
            limit_param + 1
        );
        values.push(Value::Integer(sql_limit(query.limit)));
        values.push(Value::Integer(sql_offset(query.skip)));

        self.query_items(&sql, values)
    }

    async fn count_items(&self, filter: &ItemFilter) -> StorageResult<u64> {
        let (condition, values) = filter_clause(filter, 1);
        let sql = format!("SELECT COUNT(*) FROM items WHERE {condition}");

        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to count items: {}", e)))?;
        Ok(to_count(count))
    }

    async fn expiry_candidates(&self, until: NaiveDate) -> StorageResult<Vec<Item>> {
        let sql = format!(
            "{} WHERE warranty_expiry <= ?1 OR usage_expiry <= ?1 ORDER BY item_id ASC",
            select_items()
        );
        self.query_items(&sql, vec![date_value(Some(until))])
    }

    async fn toggle_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<Vec<String>> = tx
            .query_row(
                "SELECT favorites FROM items WHERE item_id = ?1",
                [item_id],
                |row| json_column(row, 0),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read favorites: {}", e)))?;

        let Some(mut favorites) = current else {
            return Ok(false);
        };

        let now_favorite = if favorites.iter().any(|f| f == user_id) {
            favorites.retain(|f| f != user_id);
            false
        } else {
            favorites.push(user_id.to_string());
            true
        };

        tx.execute(
            "UPDATE items SET favorites = ?2 WHERE item_id = ?1",
            params![item_id, serde_json::to_string(&favorites)?],
        )
        .map_err(|e| internal_error(format!("Failed to write favorites: {}", e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(now_favorite)
    }

    async fn favorites_of(&self, user_id: &str) -> StorageResult<Vec<Item>> {
        let sql = format!(
            "{} WHERE EXISTS (SELECT 1 FROM json_each(items.favorites) WHERE json_each.value = ?1) \
             ORDER BY item_id ASC",
            select_items()
        );
        self.query_items(&sql, vec![Value::Text(user_id.to_string())])
    }

    async fn is_favorite(&self, item_id: &str, user_id: &str) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM items, json_each(items.favorites)
                WHERE items.item_id = ?1 AND json_each.value = ?2
            )",
            [item_id, user_id],
            |row| row.get(0),
        )
        .map_err(|e| internal_error(format!("Failed to check favorite: {}", e)))
    }

    async fn all_items(&self) -> StorageResult<Vec<Item>> {
        self.list_items(&ItemQuery::new()).await
    }

    async fn location_choices(&self) -> StorageResult<LocationChoices> {
        Ok(LocationChoices {
            floors: self.distinct_values("floor")?,
            rooms: self.distinct_values("room")?,
            zones: self.distinct_values("zone")?,
        })
    }

    async fn item_stats(&self) -> StorageResult<ItemStats> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(photo <> ''), 0),
                    COALESCE(SUM(store_place <> ''), 0),
                    COALESCE(SUM(item_type <> ''), 0)
             FROM items",
            [],
            |row| {
                Ok(ItemStats {
                    total: to_count(row.get(0)?),
                    with_photo: to_count(row.get(1)?),
                    with_location: to_count(row.get(2)?),
                    with_type: to_count(row.get(3)?),
                })
            },
        )
        .map_err(|e| internal_error(format!("Failed to compute item stats: {}", e)))
    }
}
