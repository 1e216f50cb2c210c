//! Core storage traits and abstractions.
//!
//! This module provides the contracts both adapters implement:
//!
//! - [`Backend`] - lifecycle of an adapter
//! - [`ItemStore`], [`TypeStore`], [`LocationStore`], [`UserStore`], [`LogStore`] -
//!   per-aggregate operations
//! - [`ArrayFieldOps`] - element-level mutation of array fields
//! - [`BackendSelector`] - call-time choice of the active backend
//!
//! # Trait Hierarchy
//!
//! ```text
//! StorageBackend
//!     ├── Backend
//!     ├── ItemStore
//!     ├── TypeStore
//!     ├── LocationStore
//!     ├── UserStore
//!     ├── LogStore
//!     └── ArrayFieldOps
//! ```
//!
//! [`StorageBackend`] has a blanket implementation, so an adapter only
//! implements the individual traits and is then usable as a [`DynBackend`].

pub mod arrays;
pub mod backend;
pub mod catalog;
pub mod items;
pub mod logs;
pub mod selector;
pub mod users;

pub use arrays::{element_matches, ArrayField, ArrayFieldOps, ArrayMatch, ArrayOwner, ArrayUpdate};
pub use backend::{Backend, BackendKind, DynBackend, StorageBackend};
pub use catalog::{LocationStore, TypeStore};
pub use items::ItemStore;
pub use logs::LogStore;
pub use selector::{BackendSelector, BackendSwitch, DB_TYPE_ENV};
pub use users::UserStore;
