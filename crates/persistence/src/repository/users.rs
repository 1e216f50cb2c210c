//! User facade.

use std::sync::Arc;

use crate::core::{ArrayField, ArrayFieldOps, UserStore};
use crate::error::StorageResult;
use crate::types::{timestamp, LoginEvent, NotificationSettings, User, LOGIN_HISTORY_LIMIT};

use super::Dispatch;

/// Operations on users, keyed by username.
#[derive(Debug, Clone)]
pub struct UserRepository {
    dispatch: Arc<Dispatch>,
}

impl UserRepository {
    pub(crate) fn new(dispatch: Arc<Dispatch>) -> Self {
        Self { dispatch }
    }

    pub async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        self.dispatch.backend()?.find_user(username).await
    }

    /// Looks a user up ignoring case.
    pub async fn find_by_username_ci(&self, username: &str) -> StorageResult<Option<User>> {
        self.dispatch.backend()?.find_user_ci(username).await
    }

    /// Creates a user and returns its id.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the username is taken, including by a name that
    /// differs only in case. Both stores enforce this with a unique index, so
    /// concurrent inserts of case variants admit exactly one.
    pub async fn insert(&self, user: &User) -> StorageResult<String> {
        self.dispatch.backend()?.insert_user(user).await
    }

    /// Replaces the password hash and its `password_changed` flag.
    pub async fn update_credential(
        &self,
        username: &str,
        password_hash: &str,
        password_changed: bool,
    ) -> StorageResult<bool> {
        self.dispatch
            .backend()?
            .update_credential(username, password_hash, password_changed)
            .await
    }

    /// Appends a login attempt, keeping the most recent ones.
    ///
    /// A successful attempt also becomes the user's last login.
    pub async fn record_login_event(&self, username: &str, event: &LoginEvent) -> StorageResult<bool> {
        let backend = self.dispatch.backend()?;

        let outcome = backend
            .append_bounded(
                username,
                ArrayField::LoginHistory,
                serde_json::to_value(event)?,
                Some(LOGIN_HISTORY_LIMIT),
            )
            .await?;
        if !outcome.found() {
            return Ok(false);
        }

        if event.success {
            backend
                .touch_last_login(username, &timestamp::format(&event.at), &event.ip)
                .await?;
        }
        Ok(true)
    }

    pub async fn notification_settings(
        &self,
        username: &str,
    ) -> StorageResult<Option<NotificationSettings>> {
        self.dispatch.backend()?.notification_settings(username).await
    }

    pub async fn set_notification_settings(
        &self,
        username: &str,
        settings: &NotificationSettings,
    ) -> StorageResult<bool> {
        self.dispatch
            .backend()?
            .set_notification_settings(username, settings)
            .await
    }

    /// All users ordered by username.
    pub async fn list_all(&self) -> StorageResult<Vec<User>> {
        self.dispatch.backend()?.list_users().await
    }
}
