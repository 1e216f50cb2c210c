//! Audit log entries.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// An append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Backend-opaque identifier, empty until stored.
    #[serde(default)]
    pub id: String,

    /// What happened, e.g. `add_item`.
    pub action: String,

    /// Acting username.
    #[serde(default)]
    pub user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,

    /// Free-form detail payload.
    #[serde(default)]
    pub details: serde_json::Value,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(action: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            action: action.into(),
            user: user.into(),
            item_id: None,
            item_name: None,
            details: serde_json::Value::Null,
            // Stored precision is microseconds.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Attaches the subject item.
    pub fn with_item(mut self, item_id: impl Into<String>, item_name: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self.item_name = Some(item_name.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at.trunc_subsecs(6);
        self
    }
}

/// Exact-match predicates for log queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Returns `(field, value)` pairs for the set predicates.
    pub fn predicates(&self) -> Vec<(&'static str, &str)> {
        [
            ("action", &self.action),
            ("user", &self.user),
            ("item_id", &self.item_id),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}
