//! Element-level mutation of array-valued fields.
//!
//! The document store mutates arrays with native atomic operators; the
//! relational store keeps them in JSON columns and rewrites the column inside
//! an immediate transaction. [`ArrayFieldOps`] hides that difference so the
//! facades never encode backend-specific mutation logic.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;

/// Which aggregate owns an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOwner {
    /// Keyed by `ItemID`.
    Item,
    /// Keyed by username.
    User,
}

/// Array-valued fields that support element-level mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayField {
    /// User ids on an item.
    Favorites,
    /// `{id, type}` links on an item.
    RelatedItems,
    /// Append-only `{date, from_location, to_location}` records on an item.
    MoveHistory,
    /// Bounded login events on a user.
    LoginHistory,
}

impl ArrayField {
    pub fn owner(&self) -> ArrayOwner {
        match self {
            ArrayField::Favorites | ArrayField::RelatedItems | ArrayField::MoveHistory => {
                ArrayOwner::Item
            }
            ArrayField::LoginHistory => ArrayOwner::User,
        }
    }

    /// Field name in documents; also the relational column name.
    pub fn name(&self) -> &'static str {
        match self {
            ArrayField::Favorites => "favorites",
            ArrayField::RelatedItems => "related_items",
            ArrayField::MoveHistory => "move_history",
            ArrayField::LoginHistory => "login_history",
        }
    }
}

impl std::fmt::Display for ArrayField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Selects array elements to remove.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayMatch {
    /// Elements matching the value; objects match on the fields they name.
    Value(Value),
    /// Object elements whose `name` field equals `value`.
    Field { name: String, value: Value },
}

impl ArrayMatch {
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        ArrayMatch::Field {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns true if `element` is selected.
    pub fn matches(&self, element: &Value) -> bool {
        match self {
            ArrayMatch::Value(needle) => element_matches(element, needle),
            ArrayMatch::Field { name, value } => element.get(name) == Some(value),
        }
    }
}

/// Outcome of an array mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayUpdate {
    /// The array was modified.
    Changed,
    /// The owner exists but the array already had the requested shape.
    Unchanged,
    /// No owner record with that key.
    NotFound,
}

impl ArrayUpdate {
    pub fn changed(&self) -> bool {
        matches!(self, ArrayUpdate::Changed)
    }

    /// Returns true unless the owner was missing.
    pub fn found(&self) -> bool {
        !matches!(self, ArrayUpdate::NotFound)
    }
}

/// Equality used for set semantics on array elements.
///
/// An object needle matches any object element carrying the same values for
/// every field the needle names; other needles use plain equality.
pub fn element_matches(element: &Value, needle: &Value) -> bool {
    match (element, needle) {
        (Value::Object(element), Value::Object(needle)) => needle
            .iter()
            .all(|(key, value)| element.get(key) == Some(value)),
        _ => element == needle,
    }
}

/// Element-level array mutation, implemented once per adapter.
///
/// `key` is the owner's business key: `ItemID` for item fields, username for
/// user fields.
#[async_trait]
pub trait ArrayFieldOps: Send + Sync {
    /// Appends `value` unless a matching element is already present.
    async fn add_unique(&self, key: &str, field: ArrayField, value: Value)
    -> StorageResult<ArrayUpdate>;

    /// Removes every element selected by `selector`.
    async fn remove(
        &self,
        key: &str,
        field: ArrayField,
        selector: &ArrayMatch,
    ) -> StorageResult<ArrayUpdate>;

    /// Appends `value`, then keeps only the newest `cap` elements.
    ///
    /// `None` never truncates.
    async fn append_bounded(
        &self,
        key: &str,
        field: ArrayField,
        value: Value,
        cap: Option<usize>,
    ) -> StorageResult<ArrayUpdate>;
}
