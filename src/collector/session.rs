use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::collector::filter::UserFilters;
use crate::entities::User;
use crate::entries::EntryType;
use crate::extractor::DateGate;
use crate::fetcher::Cookies;

pub const NOTE_FOLDER_COOKIE: &str = "folder";

/// Process-wide collection settings, shared by every user's pass.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Concurrent content fetches per user. Values below one mean one.
    pub limit_concurrency: i64,
    /// Deliver submissions oldest first.
    pub iterate_backwards: bool,
    pub only_since_registration: bool,
    pub only_since_type_enabled: bool,
    pub respect_blocked_tags: bool,
    pub filters: Arc<UserFilters>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            limit_concurrency: 4,
            iterate_backwards: true,
            only_since_registration: true,
            only_since_type_enabled: true,
            respect_blocked_tags: true,
            filters: Arc::new(UserFilters::new()),
        }
    }
}

/// Everything one user's collection pass needs. Built fresh for each pass and
/// never modified while it runs.
#[derive(Debug, Clone)]
pub struct CollectorSession {
    user_id: i64,
    cookies: Cookies,
    unread_notes_only: bool,
    registration_date: DateTime<Utc>,
    type_enabled_since: HashMap<EntryType, DateTime<Utc>>,
    settings: CollectorSettings,
}

impl CollectorSession {
    pub fn new(
        user_id: i64,
        cookies: Cookies,
        registration_date: DateTime<Utc>,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            user_id,
            cookies,
            unread_notes_only: false,
            registration_date,
            type_enabled_since: HashMap::new(),
            settings,
        }
    }

    pub fn from_user(user: &User, settings: &CollectorSettings) -> Self {
        let mut session = Self::new(user.id, user.cookie_jar(), user.created_at, settings.clone())
            .with_unread_notes_only(user.unread_notes_only);
        for entry_type in &user.entry_types {
            session = session.with_type_enabled(entry_type.entry_type, entry_type.enabled_at);
        }
        session
    }

    pub fn with_unread_notes_only(mut self, unread_notes_only: bool) -> Self {
        self.unread_notes_only = unread_notes_only;
        self
    }

    pub fn with_type_enabled(mut self, entry_type: EntryType, since: DateTime<Utc>) -> Self {
        self.type_enabled_since.insert(entry_type, since);
        self
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Cookies for the notes inbox, with the folder selected by the user's
    /// unread-only preference.
    pub fn note_cookies(&self) -> Cookies {
        let folder = if self.unread_notes_only { "unread" } else { "inbox" };
        self.cookies.with(NOTE_FOLDER_COOKIE, folder)
    }

    pub fn limit_concurrency(&self) -> usize {
        self.settings.limit_concurrency.max(1) as usize
    }

    pub fn iterate_backwards(&self) -> bool {
        self.settings.iterate_backwards
    }

    pub fn respect_blocked_tags(&self) -> bool {
        self.settings.respect_blocked_tags
    }

    pub fn type_enabled_since(&self, entry_type: EntryType) -> Option<DateTime<Utc>> {
        self.type_enabled_since.get(&entry_type).copied()
    }

    /// A date is valid when it is not before the user's registration and not
    /// before the type was enabled, each floor applying only when configured.
    pub fn date_is_valid(&self, entry_type: EntryType, date: DateTime<Utc>) -> bool {
        if self.settings.only_since_registration && date < self.registration_date {
            return false;
        }
        if self.settings.only_since_type_enabled
            && let Some(since) = self.type_enabled_since(entry_type)
            && date < since
        {
            return false;
        }
        true
    }

    pub fn is_whitelisted(&self, entry_type: EntryType, user: &str) -> bool {
        self.settings.filters.is_whitelisted(entry_type, user)
    }
}

impl DateGate for CollectorSession {
    fn accepts(&self, entry_type: EntryType, date: DateTime<Utc>) -> bool {
        self.date_is_valid(entry_type, date)
    }
}
