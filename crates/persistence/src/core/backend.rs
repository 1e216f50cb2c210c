//! Backend abstraction for the two store families.
//!
//! This module defines the [`Backend`] trait for lifecycle concerns shared by
//! every adapter, and [`StorageBackend`], the object-safe bundle of every
//! store contract that the repository facades dispatch to.

use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::arrays::ArrayFieldOps;
use crate::core::catalog::{LocationStore, TypeStore};
use crate::core::items::ItemStore;
use crate::core::logs::LogStore;
use crate::core::users::UserStore;
use crate::error::BackendError;

/// Identifies which family of store an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Schema-less collection store (MongoDB).
    Document,
    /// Mapped relational tables (SQLite).
    Relational,
}

impl BackendKind {
    /// The backend used when configuration names none.
    pub const DEFAULT: BackendKind = BackendKind::Document;

    /// Returns both kinds.
    pub fn all() -> [BackendKind; 2] {
        [BackendKind::Document, BackendKind::Relational]
    }

    /// Returns the canonical configuration value.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Document => "document",
            BackendKind::Relational => "relational",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "mongo" | "mongodb" => Ok(BackendKind::Document),
            "relational" | "sqlite" | "postgres" | "postgresql" | "sql" => {
                Ok(BackendKind::Relational)
            }
            other => Err(format!("unknown backend type: {other}")),
        }
    }
}

/// Lifecycle of a storage adapter.
///
/// Adapters are opened by their own constructors; `initialize` creates the
/// schema or indexes and `shutdown` releases connections.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Creates tables or indexes if needed. Safe to call repeatedly.
    async fn initialize(&self) -> Result<(), BackendError>;

    /// Releases held connections.
    async fn shutdown(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Every contract a facade can dispatch to.
pub trait StorageBackend:
    Backend + ItemStore + TypeStore + LocationStore + UserStore + LogStore + ArrayFieldOps
{
}

impl<T> StorageBackend for T where
    T: Backend + ItemStore + TypeStore + LocationStore + UserStore + LogStore + ArrayFieldOps
{
}

/// A shared, type-erased adapter.
pub type DynBackend = Arc<dyn StorageBackend>;
