//! Larder Persistence Layer
//!
//! This crate stores the records of a household inventory tracker (items,
//! item types, locations, users and an audit log) in either of two stores
//! with identical observable behavior: a MongoDB document store or a SQLite
//! relational store.
//!
//! # Features
//!
//! - **Two Backends**: MongoDB and SQLite behind one set of store traits
//! - **Call-time Selection**: the active backend is resolved on every call
//! - **Atomic Array Mutation**: favorites, related items, move and login history
//! - **Cache-Aside**: type and location lists cached with a TTL and evicted on write
//! - **Backup/Restore**: backend-neutral snapshots with merge or replace
//!
//! # Backend Features
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! larder-persistence = { version = "0.1", features = ["mongodb", "redis"] }
//! ```
//!
//! Available features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//! - `mongodb` - MongoDB document storage
//! - `redis` - Redis cache backend
//!
//! # Architecture
//!
//! - [`types`] - Backend-neutral records, queries and patches
//! - [`error`] - Error types for all operations
//! - [`core`] - Store traits, array operations and the backend selector
//! - [`backends`] - Backend implementations
//! - [`cache`] - Cache backends and the cache-aside helper
//! - [`repository`] - Facades dispatching to the active backend
//! - [`config`] - Configuration from arguments and environment
//!
//! # Quick Start
//!
//! ```no_run
//! use larder_persistence::config::StorageConfig;
//! use larder_persistence::repository::Repositories;
//! use larder_persistence::types::{ItemFilter, ItemQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_env();
//! let repos = Repositories::open(&config).await?;
//!
//! let tools = repos
//!     .items()
//!     .list(&ItemQuery::new().with_filter(ItemFilter::new().item_type("Tools")))
//!     .await?;
//! println!("{} tools", tools.len());
//!
//! repos.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Identifiers
//!
//! Items are addressed by their `ItemID` business key. Every other record
//! carries an opaque string `id` produced by the active backend; see
//! [`types::id`].

#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod repository;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Item, ItemFilter, ItemPatch, ItemQuery};

// Re-export core traits
pub use core::{
    ArrayFieldOps, Backend, BackendKind, BackendSelector, ItemStore, LocationStore, LogStore,
    StorageBackend, TypeStore, UserStore,
};

pub use config::StorageConfig;
pub use repository::Repositories;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
