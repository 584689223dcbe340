use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::entries::{EntryType, UnknownEntryType};
use crate::fetcher::Cookies;

/// --- Tables ---

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub chat_id: i64,
    pub unread_notes_only: bool,
    pub invalid_credentials_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserCookie {
    pub user_id: i64,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserEntryTypeRow {
    pub user_id: i64,
    pub entry_type: i16,
    pub enabled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct KnownEntryRow {
    pub entry_type: i16,
    pub entry_id: i64,
    pub user_id: i64,
    pub notified_at: DateTime<Utc>,
    pub sent_date: Option<DateTime<Utc>>,
}

/// --- Domain ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserEntryType {
    pub entry_type: EntryType,
    pub enabled_at: DateTime<Utc>,
}

impl TryFrom<UserEntryTypeRow> for UserEntryType {
    type Error = UnknownEntryType;

    fn try_from(row: UserEntryTypeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entry_type: EntryType::try_from(row.entry_type)?,
            enabled_at: row.enabled_at,
        })
    }
}

/// A registered user together with the session cookies and the entry types
/// they want to hear about.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub unread_notes_only: bool,
    pub invalid_credentials_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub cookies: Vec<UserCookie>,
    pub entry_types: Vec<UserEntryType>,
}

impl User {
    pub fn from_row(row: UserRow, cookies: Vec<UserCookie>, entry_types: Vec<UserEntryType>) -> Self {
        Self {
            id: row.id,
            chat_id: row.chat_id,
            unread_notes_only: row.unread_notes_only,
            invalid_credentials_sent_at: row.invalid_credentials_sent_at,
            created_at: row.created_at,
            cookies,
            entry_types,
        }
    }

    pub fn cookie_jar(&self) -> Cookies {
        self.cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    /// Enabled entry types in their fixed order.
    pub fn enabled_entry_types(&self) -> Vec<EntryType> {
        EntryType::valid_entry_types()
            .iter()
            .copied()
            .filter(|t| self.entry_types.iter().any(|e| e.entry_type == *t))
            .collect()
    }

    pub fn type_enabled_since(&self, entry_type: EntryType) -> Option<DateTime<Utc>> {
        self.entry_types
            .iter()
            .find(|e| e.entry_type == entry_type)
            .map(|e| e.enabled_at)
    }
}

/// Marks an entry as already delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownEntry {
    pub entry_type: EntryType,
    pub entry_id: u64,
    pub user_id: i64,
    pub notified_at: DateTime<Utc>,
    pub sent_date: Option<DateTime<Utc>>,
}

impl TryFrom<KnownEntryRow> for KnownEntry {
    type Error = UnknownEntryType;

    fn try_from(row: KnownEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entry_type: EntryType::try_from(row.entry_type)?,
            entry_id: row.entry_id as u64,
            user_id: row.user_id,
            notified_at: row.notified_at,
            sent_date: row.sent_date,
        })
    }
}
