//! Identifier normalization.
//!
//! Locations, logs, types and users have no natural key that callers can rely
//! on, so they carry an opaque string id. The document store uses ObjectIds
//! (24 hex characters) and the relational store uses integer row ids. Callers
//! only ever see the string form; a string that does not parse for the
//! backend it is handed to names no record.

/// Formats a relational row id.
pub fn from_row_id(id: i64) -> String {
    id.to_string()
}

/// Parses a relational row id. Only canonical positive integers are accepted.
pub fn to_row_id(id: &str) -> Option<i64> {
    if id.is_empty() || id.starts_with('+') || (id.len() > 1 && id.starts_with('0')) {
        return None;
    }
    id.parse::<i64>().ok().filter(|n| *n > 0)
}

/// Formats a document ObjectId.
#[cfg(feature = "mongodb")]
pub fn from_object_id(id: &mongodb::bson::oid::ObjectId) -> String {
    id.to_hex()
}

/// Parses a document ObjectId.
#[cfg(feature = "mongodb")]
pub fn to_object_id(id: &str) -> Option<mongodb::bson::oid::ObjectId> {
    mongodb::bson::oid::ObjectId::parse_str(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_round_trip() {
        assert_eq!(to_row_id(&from_row_id(42)), Some(42));
    }

    #[test]
    fn test_row_id_rejects_non_canonical() {
        for bad in ["", "0", "-3", "+3", "007", "abc", "65f0c0ffee00000000000000"] {
            assert_eq!(to_row_id(bad), None, "{bad}");
        }
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_object_id_round_trip() {
        let oid = mongodb::bson::oid::ObjectId::new();
        assert_eq!(to_object_id(&from_object_id(&oid)), Some(oid));
        assert_eq!(to_object_id("12"), None);
    }
}
