//! Translation of neutral queries into MongoDB filters and pipelines.

use mongodb::bson::{doc, Bson, Document};

use crate::core::ArrayMatch;
use crate::error::StorageResult;
use crate::types::id::from_object_id;
use crate::types::{
    FieldValue, ItemField, ItemFilter, ItemQuery, ItemSortField, LogFilter, MatchKind,
    SortDirection, DATE_FORMAT,
};

/// Helper field ranking documents with a missing sort key.
const MISSING_RANK: &str = "_missing";

/// Builds the `find` filter for an item filter.
pub(crate) fn item_filter(filter: &ItemFilter) -> Document {
    let mut out = Document::new();
    for (field, kind, value) in filter.predicates() {
        let condition = match kind {
            MatchKind::Exact => Bson::String(value.to_string()),
            MatchKind::ContainsIgnoreCase => Bson::Document(doc! {
                "$regex": regex::escape(value),
                "$options": "i",
            }),
        };
        out.insert(field.document_field(), condition);
    }
    out
}

/// Builds the aggregation pipeline for a listing.
///
/// A computed rank puts documents whose sort key is missing or null (or an
/// empty legacy date) after every present value, in both directions, like the relational adapter.
pub(crate) fn item_pipeline(query: &ItemQuery) -> Vec<Document> {
    let mut pipeline = vec![doc! { "$match": item_filter(&query.filter) }];

    match &query.sort {
        Some(sort) => {
            let field = sort.field.field().document_field();
            let direction = match sort.direction {
                SortDirection::Ascending => 1,
                SortDirection::Descending => -1,
            };
            let path = format!("${field}");
            let mut absent = vec![Bson::Document(
                doc! { "$in": [{ "$type": path.as_str() }, ["missing", "null"]] },
            )];
            // Legacy documents store a missing date as "".
            if sort.field != ItemSortField::Name {
                absent.push(Bson::Document(doc! { "$eq": [path.as_str(), ""] }));
            }
            let rank = doc! { "$cond": [{ "$or": absent }, 1, 0] };
            let mut add_fields = Document::new();
            add_fields.insert(MISSING_RANK, rank);
            pipeline.push(doc! { "$addFields": add_fields });
            let mut sort_keys = Document::new();
            sort_keys.insert(MISSING_RANK, 1);
            sort_keys.insert(field, direction);
            sort_keys.insert(ItemField::ItemId.document_field(), 1);
            pipeline.push(doc! { "$sort": sort_keys });
        }
        None => pipeline.push(doc! { "$sort": { "ItemID": 1 } }),
    }

    if query.skip > 0 {
        pipeline.push(doc! { "$skip": to_i64(query.skip) });
    }
    if query.limit > 0 {
        pipeline.push(doc! { "$limit": to_i64(query.limit) });
    }
    let mut projection = doc! { "_id": 0 };
    if query.sort.is_some() {
        projection.insert(MISSING_RANK, 0);
    }
    pipeline.push(doc! { "$project": projection });
    pipeline
}

/// Builds the `$set` document for an item patch.
pub(crate) fn item_set(changes: &[(ItemField, FieldValue)]) -> Document {
    let mut set = Document::new();
    for (field, value) in changes {
        set.insert(field.document_field(), field_value(value));
    }
    set
}

fn field_value(value: &FieldValue) -> Bson {
    match value {
        FieldValue::Text(s) => Bson::String(s.clone()),
        FieldValue::TextList(list) => Bson::Array(list.iter().cloned().map(Bson::String).collect()),
        FieldValue::Date(Some(d)) => Bson::String(d.format(DATE_FORMAT).to_string()),
        FieldValue::Date(None) => Bson::Null,
        FieldValue::Count(n) => Bson::Int64(i64::from(*n)),
    }
}

pub(crate) fn log_filter(filter: &LogFilter) -> Document {
    let mut out = Document::new();
    for (field, value) in filter.predicates() {
        out.insert(field, value);
    }
    out
}

/// Filter that holds when no element of `field` matches `value`.
pub(crate) fn absent_element(field: &str, value: &Bson) -> Document {
    let condition = match value {
        Bson::Document(needle) => doc! { "$not": { "$elemMatch": needle.clone() } },
        other => doc! { "$ne": other.clone() },
    };
    let mut out = Document::new();
    out.insert(field, condition);
    out
}

/// The `$pull` condition for an array selector.
pub(crate) fn pull_condition(selector: &ArrayMatch) -> StorageResult<Bson> {
    Ok(match selector {
        ArrayMatch::Value(value) => mongodb::bson::to_bson(value)?,
        ArrayMatch::Field { name, value } => {
            let mut condition = Document::new();
            condition.insert(name.as_str(), mongodb::bson::to_bson(value)?);
            Bson::Document(condition)
        }
    })
}

/// Replaces the native `_id` with a string `id`.
pub(crate) fn normalize_id(doc: &mut Document) {
    if let Some(raw) = doc.remove("_id") {
        let id = match raw {
            Bson::ObjectId(oid) => from_object_id(&oid),
            Bson::String(s) => s,
            other => other.to_string(),
        };
        doc.insert("id", id);
    }
}

/// Returns true for a unique index violation.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::Command(e) => e.code == 11000,
        _ => false,
    }
}

pub(crate) fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
