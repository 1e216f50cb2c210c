//! Database backend implementations.
//!
//! Each adapter implements every storage trait in [`crate::core`] and is
//! gated behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Kind | Description |
//! |---------|---------|------|-------------|
//! | SQLite | `sqlite` | relational | Embedded database, in-memory or file |
//! | MongoDB | `mongodb` | document | Document store with native array operators |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use larder_persistence::backends::sqlite::SqliteBackend;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory SQLite backend
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Or use a file-based database
//! let backend = SqliteBackend::open("./data/larder.db")?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mongodb")]
pub mod mongodb;
