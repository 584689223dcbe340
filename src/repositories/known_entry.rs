use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use thiserror::Error;

use crate::entities::{KnownEntry, KnownEntryRow};
use crate::entries::{EntryType, UnknownEntryType};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    UnknownEntryType(#[from] UnknownEntryType),
}

/// Record of entries a user has already been notified about.
///
/// Collectors only call [`KnownEntryStore::exists`]; records are written by
/// the delivery side once an entry went out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnownEntryStore: Send + Sync {
    async fn exists(
        &self,
        entry_type: EntryType,
        entry_id: u64,
        user_id: i64,
    ) -> Result<bool, StoreError>;

    /// Inserts the record; an existing record is left untouched.
    async fn create(&self, entry: &KnownEntry) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgKnownEntryStore {
    pool: PgPool,
}

impl PgKnownEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_user(&self, user_id: i64) -> Result<Vec<KnownEntry>, StoreError> {
        let rows = sqlx::query_as::<_, KnownEntryRow>(
            r#"
            SELECT entry_type, entry_id, user_id, notified_at, sent_date
            FROM known_entries
            WHERE user_id = $1
            ORDER BY notified_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| KnownEntry::try_from(row).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl KnownEntryStore for PgKnownEntryStore {
    async fn exists(
        &self,
        entry_type: EntryType,
        entry_id: u64,
        user_id: i64,
    ) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM known_entries
                WHERE entry_type = $1 AND entry_id = $2 AND user_id = $3
            )
            "#,
        )
        .bind(entry_type.code())
        .bind(entry_id as i64)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn create(&self, entry: &KnownEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO known_entries (entry_type, entry_id, user_id, notified_at, sent_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (entry_type, entry_id, user_id) DO NOTHING
            "#,
        )
        .bind(entry.entry_type.code())
        .bind(entry.entry_id as i64)
        .bind(entry.user_id)
        .bind(entry.notified_at)
        .bind(entry.sent_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Process-local store, used when no database is wanted and in tests.
#[derive(Debug, Default)]
pub struct MemoryKnownEntryStore {
    entries: DashMap<(EntryType, u64, i64), KnownEntry>,
}

impl MemoryKnownEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KnownEntryStore for MemoryKnownEntryStore {
    async fn exists(
        &self,
        entry_type: EntryType,
        entry_id: u64,
        user_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(&(entry_type, entry_id, user_id)))
    }

    async fn create(&self, entry: &KnownEntry) -> Result<(), StoreError> {
        self.entries
            .entry((entry.entry_type, entry.entry_id, entry.user_id))
            .or_insert_with(|| entry.clone());
        Ok(())
    }
}
