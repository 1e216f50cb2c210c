//! MongoDB document-store backend.
//!
//! Each entity lives in its own collection:
//!
//! | Entity    | Collection      | Business key |
//! |-----------|-----------------|--------------|
//! | Item      | `item`          | `ItemID`     |
//! | ItemType  | `type`          | `name`       |
//! | Location  | `locations`     | `_id`        |
//! | User      | `user`          | `User`       |
//! | LogEntry  | `activity_logs` | `_id`        |
//!
//! Items are addressed by `ItemID` and never expose `_id`. Types, locations,
//! users and log entries expose `_id` as a 24-character hex `id`.
//!
//! Array fields are mutated with `$push`, `$pull` and pipeline updates, so
//! each mutation is a single atomic server-side operation.

mod arrays;
mod backend;
mod catalog;
mod items;
mod logs;
mod query;
mod users;

pub use backend::{MongoBackend, MongoBackendConfig};
