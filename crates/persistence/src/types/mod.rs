//! Records and query types shared by every backend.
//!
//! Everything here is backend-neutral:
//!
//! - [`Item`], [`ItemPatch`] - inventory items and partial updates
//! - [`ItemQuery`], [`ItemFilter`], [`ItemSort`] - listing requests
//! - [`ExpiryReport`] - expired / near-expiry classification
//! - [`ItemType`], [`Location`] - cached reference data
//! - [`User`], [`LogEntry`] - accounts and the audit trail
//! - [`Backup`] - export/restore snapshots
//!
//! # Example
//!
//! ```
//! use larder_persistence::types::{Item, ItemFilter, ItemQuery, ItemSort, ItemSortField};
//!
//! let item = Item::new("A1", "Notebook").with_type("Stationery");
//! assert_eq!(item.item_id, "A1");
//!
//! let query = ItemQuery::new()
//!     .with_filter(ItemFilter::new().name_contains("note"))
//!     .with_sort(ItemSort::descending(ItemSortField::WarrantyExpiry))
//!     .with_page(0, 20);
//! assert_eq!(query.limit, 20);
//! ```

mod backup;
mod catalog;
mod expiry;
pub mod id;
mod item;
mod log;
mod query;
pub mod timestamp;
mod user;

pub use backup::{Backup, RestoreMode, RestoreReport};
pub use catalog::{ItemType, Location, LocationPatch, NewLocation};
pub use expiry::{
    build_report, classify, latest_storable_date, threshold_date, ExpiryBucket, ExpiryReport,
};
pub use item::{FieldValue, Item, ItemField, ItemPatch, MoveRecord, RelatedItem, DATE_FORMAT};
pub use log::{LogEntry, LogFilter};
pub use query::{
    ItemFilter, ItemQuery, ItemSort, ItemSortField, ItemStats, LocationChoices, MatchKind,
    SortDirection,
};
pub use user::{LoginEvent, NotificationSettings, User, LOGIN_HISTORY_LIMIT};
