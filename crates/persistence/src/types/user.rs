//! User accounts and notification preferences.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Number of login events kept per user.
pub const LOGIN_HISTORY_LIMIT: usize = 10;

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Backend-opaque identifier.
    #[serde(default)]
    pub id: String,

    #[serde(rename = "User")]
    pub username: String,

    /// Password hash; hashing happens above this layer.
    #[serde(rename = "Password")]
    pub password_hash: String,

    #[serde(default)]
    pub admin: bool,

    /// False until the user has replaced their initial password.
    #[serde(default)]
    pub password_changed: bool,

    #[serde(flatten)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub last_login: String,

    #[serde(default)]
    pub last_login_ip: String,

    /// Most recent login events, oldest first.
    #[serde(default)]
    pub login_history: Vec<LoginEvent>,
}

impl User {
    /// Creates a user with default preferences.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            username: username.into(),
            password_hash: password_hash.into(),
            admin: false,
            password_changed: false,
            notifications: NotificationSettings::default(),
            last_login: String::new(),
            last_login_ip: String::new(),
            login_history: Vec::new(),
        }
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Returns true if the user must pick a new password before continuing.
    pub fn requires_password_change(&self) -> bool {
        !self.password_changed
    }
}

/// Expiry and replacement notification preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub notify_enabled: bool,

    /// Look-ahead window for expiry notices.
    #[serde(default = "default_notify_days")]
    pub notify_days: u32,

    /// Local send time, `HH:MM`.
    #[serde(default = "default_notify_time")]
    pub notify_time: String,

    #[serde(default)]
    pub notify_channels: Vec<String>,

    /// Comma-separated reminder offsets in days.
    #[serde(default = "default_reminder_ladder")]
    pub reminder_ladder: String,

    #[serde(default)]
    pub last_notification_date: String,

    #[serde(default = "default_true")]
    pub replacement_enabled: bool,

    #[serde(default)]
    pub replacement_intervals: Vec<serde_json::Value>,
}

fn default_notify_days() -> u32 {
    30
}

fn default_notify_time() -> String {
    "09:00".to_string()
}

fn default_reminder_ladder() -> String {
    "30,14,7,3,1".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: String::new(),
            notify_enabled: false,
            notify_days: default_notify_days(),
            notify_time: default_notify_time(),
            notify_channels: Vec::new(),
            reminder_ladder: default_reminder_ladder(),
            last_notification_date: String::new(),
            replacement_enabled: true,
            replacement_intervals: Vec::new(),
        }
    }
}

/// One login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    #[serde(with = "timestamp")]
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub ip: String,
    pub success: bool,
}

impl LoginEvent {
    /// Creates an event stamped with the current time.
    pub fn now(ip: impl Into<String>, success: bool) -> Self {
        Self {
            at: Utc::now().trunc_subsecs(6),
            ip: ip.into(),
            success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_document_shape_is_flat() {
        let user = User::new("alice", "hash");
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["User"], "alice");
        assert_eq!(value["Password"], "hash");
        assert_eq!(value["notify_days"], 30);
        assert_eq!(value["reminder_ladder"], "30,14,7,3,1");
    }

    #[test]
    fn test_user_defaults_from_sparse_document() {
        let user: User = serde_json::from_value(json!({
            "User": "bob",
            "Password": "x"
        }))
        .unwrap();
        assert!(user.requires_password_change());
        assert!(user.notifications.replacement_enabled);
        assert_eq!(user.notifications.notify_time, "09:00");
    }

    #[test]
    fn test_password_change_flag_is_per_user() {
        let mut admin = User::new("admin", "x").with_admin(true);
        admin.password_changed = true;
        assert!(!admin.requires_password_change());
    }
}
