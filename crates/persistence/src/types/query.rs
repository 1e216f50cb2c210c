//! Item search, sort and pagination types.
//!
//! Both adapters translate these into native queries. The semantics they must
//! agree on:
//!
//! - exact match on type, floor, room and zone
//! - case-insensitive substring match on name and store place
//! - empty filter values are ignored
//! - records with a missing sort key sort after every present value, in both
//!   directions
//! - ties are broken by `ItemID` ascending
//! - `skip` and `limit` of zero mean "no bound"

use serde::{Deserialize, Serialize};

use super::item::ItemField;

/// Predicates for item listing and counting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Case-insensitive substring of `ItemName`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,

    /// Case-insensitive substring of `ItemStorePlace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_place_contains: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// How a single filter field is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    ContainsIgnoreCase,
}

impl ItemFilter {
    /// Creates an empty filter that matches every item.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_contains(mut self, value: impl Into<String>) -> Self {
        self.name_contains = Some(value.into());
        self
    }

    pub fn store_place_contains(mut self, value: impl Into<String>) -> Self {
        self.store_place_contains = Some(value.into());
        self
    }

    pub fn item_type(mut self, value: impl Into<String>) -> Self {
        self.item_type = Some(value.into());
        self
    }

    pub fn floor(mut self, value: impl Into<String>) -> Self {
        self.floor = Some(value.into());
        self
    }

    pub fn room(mut self, value: impl Into<String>) -> Self {
        self.room = Some(value.into());
        self
    }

    pub fn zone(mut self, value: impl Into<String>) -> Self {
        self.zone = Some(value.into());
        self
    }

    /// Returns the active predicates, skipping unset and empty values.
    pub fn predicates(&self) -> Vec<(ItemField, MatchKind, &str)> {
        let candidates = [
            (ItemField::Name, MatchKind::ContainsIgnoreCase, &self.name_contains),
            (
                ItemField::StorePlace,
                MatchKind::ContainsIgnoreCase,
                &self.store_place_contains,
            ),
            (ItemField::ItemType, MatchKind::Exact, &self.item_type),
            (ItemField::Floor, MatchKind::Exact, &self.floor),
            (ItemField::Room, MatchKind::Exact, &self.room),
            (ItemField::Zone, MatchKind::Exact, &self.zone),
        ];

        candidates
            .into_iter()
            .filter_map(|(field, kind, value)| match value.as_deref() {
                Some(v) if !v.is_empty() => Some((field, kind, v)),
                _ => None,
            })
            .collect()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Fields an item listing can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortField {
    Name,
    WarrantyExpiry,
    UsageExpiry,
}

impl ItemSortField {
    /// The item field this sort key reads.
    pub fn field(&self) -> ItemField {
        match self {
            ItemSortField::Name => ItemField::Name,
            ItemSortField::WarrantyExpiry => ItemField::WarrantyExpiry,
            ItemSortField::UsageExpiry => ItemField::UsageExpiry,
        }
    }
}

/// A sort key and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSort {
    pub field: ItemSortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl ItemSort {
    pub fn ascending(field: ItemSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: ItemSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// A filtered, sorted, offset-paginated item listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub filter: ItemFilter,
    #[serde(default)]
    pub sort: Option<ItemSort>,
    /// Records to skip; zero means none.
    #[serde(default)]
    pub skip: u64,
    /// Maximum records to return; zero means no limit.
    #[serde(default)]
    pub limit: u64,
}

impl ItemQuery {
    /// Creates a query for every item in `ItemID` order.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: ItemSort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets offset pagination.
    pub fn with_page(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }
}

/// Distinct location values currently used by items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationChoices {
    pub floors: Vec<String>,
    pub rooms: Vec<String>,
    pub zones: Vec<String>,
}

/// Item counts used by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub total: u64,
    pub with_photo: u64,
    pub with_location: u64,
    pub with_type: u64,
}
