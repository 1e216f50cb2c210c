//! SQLite backend implementation.
//!
//! This module provides the relational adapter. It supports both in-memory
//! databases (used by the test suites) and file-based databases.
//!
//! # Features
//!
//! - In-memory and file-based modes
//! - Every mutation runs in its own transaction, committed before returning
//! - Array fields stored as JSON columns, mutated read-modify-write under
//!   `BEGIN IMMEDIATE`
//! - Unicode case folding for substring filters via a registered SQL function
//!
//! # Example
//!
//! ```no_run
//! use larder_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory database
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Initialize the schema
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE items (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     item_id TEXT NOT NULL UNIQUE,      -- business key
//!     name TEXT NOT NULL,
//!     ...
//!     warranty_expiry TEXT,              -- YYYY-MM-DD or NULL
//!     usage_expiry TEXT,
//!     move_history TEXT NOT NULL,        -- JSON array
//!     favorites TEXT NOT NULL,           -- JSON array of user ids
//!     related_items TEXT NOT NULL        -- JSON array of {id, type}
//! );
//!
//! CREATE TABLE item_types (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
//! CREATE TABLE locations (id INTEGER PRIMARY KEY, floor, room, zone, sort_order);
//! CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT NOT NULL UNIQUE, ...);
//! CREATE TABLE logs (id INTEGER PRIMARY KEY, action, user, ..., created_at TEXT);
//! ```

mod arrays;
mod backend;
mod catalog;
mod items;
mod logs;
mod schema;
mod users;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
