#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{StatusCode, header::HeaderMap};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use furwatch::{
    entities::{User, UserCookie, UserEntryType},
    entries::{Entry, EntryType},
    fetcher::{Charset, Cookies, DocumentFetcher, FetchError, PageResponse},
    notify::Notifier,
    repositories::{StoreError, UserDirectory},
};

pub const NOTES_LISTING: &str = include_str!("../src/extractor/tests/fixtures/notes.html");
pub const NOTE_VIEW: &str = include_str!("../src/extractor/tests/fixtures/note_view.html");
pub const SUBMISSIONS_LISTING: &str =
    include_str!("../src/extractor/tests/fixtures/submissions.html");
pub const SUBMISSION_VIEW: &str =
    include_str!("../src/extractor/tests/fixtures/submission_view.html");
pub const OTHERS_LISTING: &str = include_str!("../src/extractor/tests/fixtures/others.html");
pub const COMMENT_VIEW: &str = include_str!("../src/extractor/tests/fixtures/comment_view.html");
pub const JOURNAL_VIEW: &str = include_str!("../src/extractor/tests/fixtures/journal_view.html");
pub const SETTINGS_LOGGED_OUT: &str =
    include_str!("../src/extractor/tests/fixtures/settings_logged_out.html");

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Serves canned pages keyed by URL path and records every request.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    statuses: HashMap<String, StatusCode>,
    fetched: Mutex<Vec<(String, Cookies)>>,
    posts: Mutex<Vec<(String, Vec<(String, String)>)>>,
    post_cookies: Mutex<Vec<Cookies>>,
    post_delay: Option<Duration>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, path: &str, html: &str) -> Self {
        self.pages.insert(path.to_string(), html.to_string());
        self
    }

    pub fn with_status(mut self, path: &str, status: StatusCode) -> Self {
        self.statuses.insert(path.to_string(), status);
        self
    }

    /// Makes every form POST wait `delay` before it is recorded.
    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = Some(delay);
        self
    }

    pub fn fetched_paths(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn cookies_for(&self, path: &str) -> Option<Cookies> {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, cookies)| cookies.clone())
    }

    pub fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_cookies(&self) -> Vec<Cookies> {
        self.post_cookies.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch(&self, url: &Url, cookies: &Cookies) -> Result<PageResponse, FetchError> {
        let path = url.path().to_string();
        self.fetched
            .lock()
            .unwrap()
            .push((path.clone(), cookies.clone()));

        if let Some(status) = self.statuses.get(&path) {
            return Err(FetchError::from_status(*status));
        }
        let Some(html) = self.pages.get(&path) else {
            return Err(FetchError::from_status(StatusCode::NOT_FOUND));
        };

        Ok(PageResponse {
            url_final: url.clone(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body_raw: Bytes::from(html.clone()),
            body_utf8: html.clone(),
            charset: Charset::Utf8,
            fetched_at: Utc::now(),
        })
    }

    async fn post_form(
        &self,
        url: &Url,
        cookies: &Cookies,
        form: &[(String, String)],
    ) -> Result<(), FetchError> {
        if let Some(delay) = self.post_delay {
            tokio::time::sleep(delay).await;
        }
        self.post_cookies.lock().unwrap().push(cookies.clone());
        self.posts
            .lock()
            .unwrap()
            .push((url.path().to_string(), form.to_vec()));
        Ok(())
    }
}

/// In-memory user table.
#[derive(Default)]
pub struct StubUsers {
    pub users: Mutex<Vec<User>>,
    pub credential_marks: Mutex<Vec<(i64, Option<DateTime<Utc>>)>>,
}

impl StubUsers {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            credential_marks: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UserDirectory for StubUsers {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn set_invalid_credentials_sent_at(
        &self,
        user_id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.credential_marks.lock().unwrap().push((user_id, at));
        for user in self.users.lock().unwrap().iter_mut() {
            if user.id == user_id {
                user.invalid_credentials_sent_at = at;
            }
        }
        Ok(())
    }
}

/// Notifier that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub entries: Mutex<Vec<(i64, EntryType, u64)>>,
    pub invalid_credentials: Mutex<Vec<i64>>,
    panic_for: Option<i64>,
}

impl RecordingNotifier {
    /// Notifier that panics whenever it is asked to notify `chat_id`.
    pub fn panicking_for(chat_id: i64) -> Self {
        Self {
            panic_for: Some(chat_id),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_entry(&self, chat_id: i64, entry: &Entry) -> Result<()> {
        if self.panic_for == Some(chat_id) {
            panic!("notifier crashed for chat {chat_id}");
        }
        self.entries
            .lock()
            .unwrap()
            .push((chat_id, entry.entry_type(), entry.id()));
        Ok(())
    }

    async fn notify_invalid_credentials(&self, chat_id: i64) -> Result<()> {
        self.invalid_credentials.lock().unwrap().push(chat_id);
        Ok(())
    }
}

pub fn test_user(id: i64, entry_types: &[EntryType]) -> User {
    User {
        id,
        chat_id: id * 100,
        unread_notes_only: false,
        invalid_credentials_sent_at: None,
        created_at: utc(2020, 1, 1),
        cookies: vec![
            UserCookie {
                user_id: id,
                name: "a".to_string(),
                value: "session-a".to_string(),
            },
            UserCookie {
                user_id: id,
                name: "b".to_string(),
                value: "session-b".to_string(),
            },
        ],
        entry_types: entry_types
            .iter()
            .map(|entry_type| UserEntryType {
                entry_type: *entry_type,
                enabled_at: utc(2020, 1, 1),
            })
            .collect(),
    }
}
