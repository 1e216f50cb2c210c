//! UserStore implementation for SQLite.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use crate::core::UserStore;
use crate::error::StorageResult;
use crate::types::id::from_row_id;
use crate::types::{NotificationSettings, User};

use super::backend::{internal_error, write_error, FOLD_FN};
use super::items::json_column;
use super::SqliteBackend;

const USER_COLUMNS: &str = "id, username, password_hash, admin, password_changed, notifications, \
                            last_login, last_login_ip, login_history";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: from_row_id(row.get(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        admin: row.get(3)?,
        password_changed: row.get(4)?,
        notifications: json_column(row, 5)?,
        last_login: row.get(6)?,
        last_login_ip: row.get(7)?,
        login_history: json_column(row, 8)?,
    })
}

impl SqliteBackend {
    fn update_user(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> StorageResult<bool> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        let affected = tx
            .execute(sql, params)
            .map_err(|e| internal_error(format!("Failed to update user: {}", e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl UserStore for SqliteBackend {
    async fn find_user(&self, username: &str) -> StorageResult<Option<User>> {
        let conn = self.get_connection()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            [username],
            row_to_user,
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to read user: {}", e)))
    }

    async fn find_user_ci(&self, username: &str) -> StorageResult<Option<User>> {
        let conn = self.get_connection()?;
        conn.query_row(
            &format!(
                "SELECT {USER_COLUMNS} FROM users WHERE {FOLD_FN}(username) = {FOLD_FN}(?1) \
                 ORDER BY id ASC LIMIT 1"
            ),
            [username],
            row_to_user,
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to read user: {}", e)))
    }

    async fn insert_user(&self, user: &User) -> StorageResult<String> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;
        tx.execute(
            "INSERT INTO users (username, password_hash, admin, password_changed, notifications,
                                last_login, last_login_ip, login_history)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.username,
                user.password_hash,
                user.admin,
                user.password_changed,
                serde_json::to_string(&user.notifications)?,
                user.last_login,
                user.last_login_ip,
                serde_json::to_string(&user.login_history)?,
            ],
        )
        .map_err(|e| write_error(e, "user", &user.username, "Failed to insert user"))?;
        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit: {}", e)))?;

        Ok(from_row_id(id))
    }

    async fn update_credential(
        &self,
        username: &str,
        password_hash: &str,
        password_changed: bool,
    ) -> StorageResult<bool> {
        self.update_user(
            "UPDATE users SET password_hash = ?2, password_changed = ?3 WHERE username = ?1",
            params![username, password_hash, password_changed],
        )
    }

    async fn notification_settings(
        &self,
        username: &str,
    ) -> StorageResult<Option<NotificationSettings>> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT notifications FROM users WHERE username = ?1",
            [username],
            |row| json_column(row, 0),
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to read notification settings: {}", e)))
    }

    async fn set_notification_settings(
        &self,
        username: &str,
        settings: &NotificationSettings,
    ) -> StorageResult<bool> {
        let encoded = serde_json::to_string(settings)?;
        self.update_user(
            "UPDATE users SET notifications = ?2 WHERE username = ?1",
            params![username, encoded],
        )
    }

    async fn touch_last_login(&self, username: &str, at: &str, ip: &str) -> StorageResult<bool> {
        self.update_user(
            "UPDATE users SET last_login = ?2, last_login_ip = ?3 WHERE username = ?1",
            params![username, at, ip],
        )
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY username ASC"
            ))
            .map_err(|e| internal_error(format!("Failed to prepare user query: {}", e)))?;
        let users = stmt
            .query_map([], row_to_user)
            .map_err(|e| internal_error(format!("Failed to query users: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read user row: {}", e)))?;
        Ok(users)
    }
}
