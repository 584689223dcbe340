use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use std::collections::HashMap;
use tracing::warn;

use crate::entities::{User, UserCookie, UserEntryType, UserEntryTypeRow, UserRow};
use crate::entries::EntryType;
use crate::repositories::StoreError;

/// Read access to registered users and their credential bookkeeping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users with their cookies and enabled entry types loaded.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Records when the user was told their credentials stopped working;
    /// `None` clears the mark.
    async fn set_invalid_credentials_sent_at(
        &self,
        user_id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, chat_id: i64, unread_notes_only: bool) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO users (chat_id, unread_notes_only)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(chat_id)
        .bind(unread_notes_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn set_cookie(&self, user_id: i64, name: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_cookies (user_id, name, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, name) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Enables an entry type. Re-enabling keeps the original `enabled_at`.
    pub async fn enable_entry_type(
        &self,
        user_id: i64,
        entry_type: EntryType,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_entry_types (user_id, entry_type)
            VALUES ($1, $2)
            ON CONFLICT (user_id, entry_type) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(entry_type.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn disable_entry_type(
        &self,
        user_id: i64,
        entry_type: EntryType,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM user_entry_types WHERE user_id = $1 AND entry_type = $2")
                .bind(user_id)
                .bind(entry_type.code())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, chat_id, unread_notes_only, invalid_credentials_sent_at, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let cookies = sqlx::query_as::<_, UserCookie>(
            "SELECT user_id, name, value FROM user_cookies ORDER BY user_id, name",
        )
        .fetch_all(&self.pool)
        .await?;

        let entry_types = sqlx::query_as::<_, UserEntryTypeRow>(
            "SELECT user_id, entry_type, enabled_at FROM user_entry_types ORDER BY user_id, entry_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut cookies_by_user: HashMap<i64, Vec<UserCookie>> = HashMap::new();
        for cookie in cookies {
            cookies_by_user.entry(cookie.user_id).or_default().push(cookie);
        }

        let mut types_by_user: HashMap<i64, Vec<UserEntryType>> = HashMap::new();
        for row in entry_types {
            let user_id = row.user_id;
            match UserEntryType::try_from(row) {
                Ok(entry_type) => types_by_user.entry(user_id).or_default().push(entry_type),
                Err(e) => warn!("Ignoring entry type of user {}: {}", user_id, e),
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                User::from_row(
                    row,
                    cookies_by_user.remove(&id).unwrap_or_default(),
                    types_by_user.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn set_invalid_credentials_sent_at(
        &self,
        user_id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET invalid_credentials_sent_at = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
