//! Reference data: item types and storage locations.

use serde::{Deserialize, Serialize};

/// A named item category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    /// Backend-opaque identifier.
    pub id: String,
    /// Unique type name.
    pub name: String,
}

/// A storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Backend-opaque identifier.
    pub id: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub zone: String,
    /// Display position, maintained by hand.
    #[serde(default)]
    pub order: i64,
}

impl Location {
    /// Returns true if this location has the given natural key.
    pub fn has_key(&self, floor: &str, room: &str, zone: &str) -> bool {
        self.floor == floor && self.room == room && self.zone == zone
    }

    /// Returns the location without its identifier.
    pub fn to_new(&self) -> NewLocation {
        NewLocation {
            floor: self.floor.clone(),
            room: self.room.clone(),
            zone: self.zone.clone(),
            order: self.order,
        }
    }
}

/// A location to insert. Also the backup record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub order: i64,
}

impl NewLocation {
    pub fn new(floor: impl Into<String>, room: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            floor: floor.into(),
            room: room.into(),
            zone: zone.into(),
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

/// A partial update of a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl LocationPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.floor.is_none() && self.room.is_none() && self.zone.is_none() && self.order.is_none()
    }
}
