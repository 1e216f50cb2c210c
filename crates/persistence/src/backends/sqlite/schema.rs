//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::StorageResult;

use super::backend::internal_error;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 3;

/// Initialize the database schema.
pub fn initialize_schema(conn: &mut Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .map_err(|e| internal_error(format!("Failed to begin migration: {}", e)))?;

    if current_version == 0 {
        create_schema_v1(&tx)?;
    }
    if current_version < 2 {
        migrate_v1_to_v2(&tx)?;
    }
    if current_version < 3 {
        migrate_v2_to_v3(&tx)?;
    }
    set_schema_version(&tx, SCHEMA_VERSION)?;

    tx.commit()
        .map_err(|e| internal_error(format!("Failed to commit migration: {}", e)))?;

    tracing::info!(from = current_version, to = SCHEMA_VERSION, "sqlite schema migrated");
    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| internal_error(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| internal_error(format!("Failed to clear schema_version: {}", e)))?;

    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| internal_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Base tables.
///
/// Array-valued item and user fields are JSON text columns. Expiry dates are
/// ISO `YYYY-MM-DD` text so they compare in date order.
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            photo TEXT NOT NULL DEFAULT '',
            thumbnail TEXT NOT NULL DEFAULT '',
            photos TEXT NOT NULL DEFAULT '[]',
            store_place TEXT NOT NULL DEFAULT '',
            item_type TEXT NOT NULL DEFAULT '',
            owner TEXT NOT NULL DEFAULT '',
            acquired TEXT NOT NULL DEFAULT '',
            floor TEXT NOT NULL DEFAULT '',
            room TEXT NOT NULL DEFAULT '',
            zone TEXT NOT NULL DEFAULT '',
            warranty_expiry TEXT,
            usage_expiry TEXT,
            quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
            safety_stock INTEGER NOT NULL DEFAULT 0 CHECK (safety_stock >= 0),
            reorder_level INTEGER NOT NULL DEFAULT 0 CHECK (reorder_level >= 0),
            move_history TEXT NOT NULL DEFAULT '[]',
            favorites TEXT NOT NULL DEFAULT '[]',
            related_items TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);
        CREATE INDEX IF NOT EXISTS idx_items_type ON items(item_type);
        CREATE INDEX IF NOT EXISTS idx_items_location ON items(floor, room, zone);
        CREATE INDEX IF NOT EXISTS idx_items_warranty ON items(warranty_expiry);
        CREATE INDEX IF NOT EXISTS idx_items_usage ON items(usage_expiry);

        CREATE TABLE IF NOT EXISTS item_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            floor TEXT NOT NULL DEFAULT '',
            room TEXT NOT NULL DEFAULT '',
            zone TEXT NOT NULL DEFAULT '',
            sort_order INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_locations_order ON locations(sort_order, id);

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            admin INTEGER NOT NULL DEFAULT 0,
            password_changed INTEGER NOT NULL DEFAULT 0,
            notifications TEXT NOT NULL DEFAULT '{}',
            last_login TEXT NOT NULL DEFAULT '',
            last_login_ip TEXT NOT NULL DEFAULT '',
            login_history TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL,
            user TEXT NOT NULL DEFAULT '',
            item_id TEXT,
            item_name TEXT,
            details TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_logs_created ON logs(created_at, id);
        ",
    )
    .map_err(|e| internal_error(format!("Failed to create schema v1: {}", e)))
}

/// Indexes for the log filters.
fn migrate_v1_to_v2(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_logs_item ON logs(item_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_logs_user ON logs(user, created_at);
        ",
    )
    .map_err(|e| internal_error(format!("Failed to migrate schema to v2: {}", e)))
}

/// Usernames unique ignoring case.
///
/// Fails on a database that already holds two names differing only in case.
fn migrate_v2_to_v3(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username_folded
            ON users(larder_fold(username));
        ",
    )
    .map_err(|e| internal_error(format!("Failed to migrate schema to v3: {}", e)))
}
