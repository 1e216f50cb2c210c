//! Item records and partial updates.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// An inventory item as exposed above the storage layer.
///
/// Field names serialize to the document shape used by the document store and
/// by backup files, so a backup taken from one backend restores into the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Business key, unique and immutable after creation.
    #[serde(rename = "ItemID")]
    pub item_id: String,

    #[serde(rename = "ItemName")]
    pub name: String,

    #[serde(rename = "ItemDesc", default)]
    pub description: String,

    /// Primary photo reference.
    #[serde(rename = "ItemPic", default)]
    pub photo: String,

    #[serde(rename = "ItemThumb", default)]
    pub thumbnail: String,

    /// Additional photo references.
    #[serde(rename = "ItemPics", default)]
    pub photos: Vec<String>,

    #[serde(rename = "ItemStorePlace", default)]
    pub store_place: String,

    /// Name of the [`ItemType`](super::ItemType); not enforced here.
    #[serde(rename = "ItemType", default)]
    pub item_type: String,

    #[serde(rename = "ItemOwner", default)]
    pub owner: String,

    /// Acquisition date as entered by the user.
    #[serde(rename = "ItemGetDate", default)]
    pub acquired: String,

    #[serde(rename = "ItemFloor", default)]
    pub floor: String,

    #[serde(rename = "ItemRoom", default)]
    pub room: String,

    #[serde(rename = "ItemZone", default)]
    pub zone: String,

    #[serde(
        rename = "WarrantyExpiry",
        default,
        deserialize_with = "deserialize_optional_date"
    )]
    pub warranty_expiry: Option<NaiveDate>,

    #[serde(
        rename = "UsageExpiry",
        default,
        deserialize_with = "deserialize_optional_date"
    )]
    pub usage_expiry: Option<NaiveDate>,

    #[serde(rename = "Quantity", default)]
    pub quantity: u32,

    #[serde(rename = "SafetyStock", default)]
    pub safety_stock: u32,

    #[serde(rename = "ReorderLevel", default)]
    pub reorder_level: u32,

    /// Append-only record of location changes.
    #[serde(default)]
    pub move_history: Vec<MoveRecord>,

    /// Ids of users who favorited this item.
    #[serde(default)]
    pub favorites: Vec<String>,

    /// Links to other items. The caller keeps them symmetric.
    #[serde(default)]
    pub related_items: Vec<RelatedItem>,
}

impl Item {
    /// Creates an item with only the required fields set.
    pub fn new(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            description: String::new(),
            photo: String::new(),
            thumbnail: String::new(),
            photos: Vec::new(),
            store_place: String::new(),
            item_type: String::new(),
            owner: String::new(),
            acquired: String::new(),
            floor: String::new(),
            room: String::new(),
            zone: String::new(),
            warranty_expiry: None,
            usage_expiry: None,
            quantity: 0,
            safety_stock: 0,
            reorder_level: 0,
            move_history: Vec::new(),
            favorites: Vec::new(),
            related_items: Vec::new(),
        }
    }

    /// Sets the item type.
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    /// Sets the floor/room/zone location triple.
    pub fn with_location(
        mut self,
        floor: impl Into<String>,
        room: impl Into<String>,
        zone: impl Into<String>,
    ) -> Self {
        self.floor = floor.into();
        self.room = room.into();
        self.zone = zone.into();
        self
    }

    /// Sets the warranty expiry date.
    pub fn with_warranty_expiry(mut self, date: NaiveDate) -> Self {
        self.warranty_expiry = Some(date);
        self
    }

    /// Sets the usage expiry date.
    pub fn with_usage_expiry(mut self, date: NaiveDate) -> Self {
        self.usage_expiry = Some(date);
        self
    }

    /// Returns the earliest of the two expiry dates, if any.
    pub fn earliest_expiry(&self) -> Option<NaiveDate> {
        match (self.warranty_expiry, self.usage_expiry) {
            (Some(w), Some(u)) => Some(w.min(u)),
            (w, u) => w.or(u),
        }
    }
}

/// One entry of an item's move history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Local timestamp formatted as `YYYY-MM-DD HH:MM`.
    pub date: String,
    pub from_location: String,
    pub to_location: String,
}

/// A link from one item to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedItem {
    /// The other item's `ItemID`.
    pub id: String,
    /// Free-form relation label, e.g. "accessory".
    #[serde(rename = "type")]
    pub relation: String,
}

/// The scalar fields of an item that can be filtered, sorted or patched.
///
/// This is the single mapping between document field names and relational
/// column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    ItemId,
    Name,
    Description,
    Photo,
    Thumbnail,
    Photos,
    StorePlace,
    ItemType,
    Owner,
    Acquired,
    Floor,
    Room,
    Zone,
    WarrantyExpiry,
    UsageExpiry,
    Quantity,
    SafetyStock,
    ReorderLevel,
}

impl ItemField {
    /// Field name in the document store and in serialized records.
    pub fn document_field(&self) -> &'static str {
        match self {
            ItemField::ItemId => "ItemID",
            ItemField::Name => "ItemName",
            ItemField::Description => "ItemDesc",
            ItemField::Photo => "ItemPic",
            ItemField::Thumbnail => "ItemThumb",
            ItemField::Photos => "ItemPics",
            ItemField::StorePlace => "ItemStorePlace",
            ItemField::ItemType => "ItemType",
            ItemField::Owner => "ItemOwner",
            ItemField::Acquired => "ItemGetDate",
            ItemField::Floor => "ItemFloor",
            ItemField::Room => "ItemRoom",
            ItemField::Zone => "ItemZone",
            ItemField::WarrantyExpiry => "WarrantyExpiry",
            ItemField::UsageExpiry => "UsageExpiry",
            ItemField::Quantity => "Quantity",
            ItemField::SafetyStock => "SafetyStock",
            ItemField::ReorderLevel => "ReorderLevel",
        }
    }

    /// Column name in the relational `items` table.
    pub fn column(&self) -> &'static str {
        match self {
            ItemField::ItemId => "item_id",
            ItemField::Name => "name",
            ItemField::Description => "description",
            ItemField::Photo => "photo",
            ItemField::Thumbnail => "thumbnail",
            ItemField::Photos => "photos",
            ItemField::StorePlace => "store_place",
            ItemField::ItemType => "item_type",
            ItemField::Owner => "owner",
            ItemField::Acquired => "acquired",
            ItemField::Floor => "floor",
            ItemField::Room => "room",
            ItemField::Zone => "zone",
            ItemField::WarrantyExpiry => "warranty_expiry",
            ItemField::UsageExpiry => "usage_expiry",
            ItemField::Quantity => "quantity",
            ItemField::SafetyStock => "safety_stock",
            ItemField::ReorderLevel => "reorder_level",
        }
    }
}

/// A new value for one patched field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    TextList(Vec<String>),
    Date(Option<NaiveDate>),
    Count(u32),
}

impl FieldValue {
    /// Converts the value to its JSON form, matching the serialized [`Item`].
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::TextList(list) => serde_json::Value::from(list.clone()),
            FieldValue::Date(Some(d)) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
            FieldValue::Date(None) => serde_json::Value::Null,
            FieldValue::Count(n) => serde_json::Value::from(*n),
        }
    }
}

/// Date format used for expiry dates in both backends.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A partial update of an item.
///
/// Only fields that were set are written; everything else is left untouched
/// in both backends. The business key and the array fields are not patchable
/// here; array fields change through their dedicated operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    changes: Vec<(ItemField, FieldValue)>,
}

impl ItemPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, field: ItemField, value: FieldValue) -> Self {
        self.changes.retain(|(f, _)| *f != field);
        self.changes.push((field, value));
        self
    }

    pub fn name(self, value: impl Into<String>) -> Self {
        self.set(ItemField::Name, FieldValue::Text(value.into()))
    }

    pub fn description(self, value: impl Into<String>) -> Self {
        self.set(ItemField::Description, FieldValue::Text(value.into()))
    }

    pub fn photo(self, value: impl Into<String>) -> Self {
        self.set(ItemField::Photo, FieldValue::Text(value.into()))
    }

    pub fn thumbnail(self, value: impl Into<String>) -> Self {
        self.set(ItemField::Thumbnail, FieldValue::Text(value.into()))
    }

    pub fn photos(self, value: Vec<String>) -> Self {
        self.set(ItemField::Photos, FieldValue::TextList(value))
    }

    pub fn store_place(self, value: impl Into<String>) -> Self {
        self.set(ItemField::StorePlace, FieldValue::Text(value.into()))
    }

    pub fn item_type(self, value: impl Into<String>) -> Self {
        self.set(ItemField::ItemType, FieldValue::Text(value.into()))
    }

    pub fn owner(self, value: impl Into<String>) -> Self {
        self.set(ItemField::Owner, FieldValue::Text(value.into()))
    }

    pub fn acquired(self, value: impl Into<String>) -> Self {
        self.set(ItemField::Acquired, FieldValue::Text(value.into()))
    }

    /// Moves the item to a new floor/room/zone.
    pub fn location(
        self,
        floor: impl Into<String>,
        room: impl Into<String>,
        zone: impl Into<String>,
    ) -> Self {
        self.set(ItemField::Floor, FieldValue::Text(floor.into()))
            .set(ItemField::Room, FieldValue::Text(room.into()))
            .set(ItemField::Zone, FieldValue::Text(zone.into()))
    }

    /// Sets or clears the warranty expiry date.
    pub fn warranty_expiry(self, value: Option<NaiveDate>) -> Self {
        self.set(ItemField::WarrantyExpiry, FieldValue::Date(value))
    }

    /// Sets or clears the usage expiry date.
    pub fn usage_expiry(self, value: Option<NaiveDate>) -> Self {
        self.set(ItemField::UsageExpiry, FieldValue::Date(value))
    }

    pub fn quantity(self, value: u32) -> Self {
        self.set(ItemField::Quantity, FieldValue::Count(value))
    }

    pub fn safety_stock(self, value: u32) -> Self {
        self.set(ItemField::SafetyStock, FieldValue::Count(value))
    }

    pub fn reorder_level(self, value: u32) -> Self {
        self.set(ItemField::ReorderLevel, FieldValue::Count(value))
    }

    /// Returns the fields this patch changes, in the order they were set.
    pub fn changes(&self) -> &[(ItemField, FieldValue)] {
        &self.changes
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Accepts `null`, an empty string, or an ISO date.
///
/// Older documents store missing expiry dates as `""`.
pub(crate) fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
