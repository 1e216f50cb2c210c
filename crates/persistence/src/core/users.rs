//! User storage contract.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{NotificationSettings, User};

/// User accounts, addressed by username.
///
/// Login history is changed through [`ArrayFieldOps`](super::ArrayFieldOps).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by exact username.
    async fn find_user(&self, username: &str) -> StorageResult<Option<User>>;

    /// Looks up a user ignoring case.
    async fn find_user_ci(&self, username: &str) -> StorageResult<Option<User>>;

    /// Inserts a user and returns its id.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(DuplicateKey)` - if the exact username exists
    async fn insert_user(&self, user: &User) -> StorageResult<String>;

    /// Sets the password hash and the changed flag in one write.
    async fn update_credential(
        &self,
        username: &str,
        password_hash: &str,
        password_changed: bool,
    ) -> StorageResult<bool>;

    async fn notification_settings(
        &self,
        username: &str,
    ) -> StorageResult<Option<NotificationSettings>>;

    async fn set_notification_settings(
        &self,
        username: &str,
        settings: &NotificationSettings,
    ) -> StorageResult<bool>;

    /// Records the time and address of the latest successful login.
    async fn touch_last_login(&self, username: &str, at: &str, ip: &str) -> StorageResult<bool>;

    /// Returns every user ordered by username.
    async fn list_users(&self) -> StorageResult<Vec<User>>;
}
