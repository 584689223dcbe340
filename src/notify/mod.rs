//! Delivery of collected entries.
//!
//! The chat transport lives outside this crate; it plugs in through
//! [`Notifier`]. [`Dispatcher`] records every delivered entry so later passes
//! skip it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::KnownEntry;
use crate::entries::Entry;
use crate::repositories::KnownEntryStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_entry(&self, chat_id: i64, entry: &Entry) -> Result<()>;

    /// Tells the user their session cookies stopped working.
    async fn notify_invalid_credentials(&self, chat_id: i64) -> Result<()>;
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_entry(&self, chat_id: i64, entry: &Entry) -> Result<()> {
        let blocked = entry
            .as_submission()
            .map(|s| s.is_blocked())
            .unwrap_or(false);
        info!(
            chat_id,
            entry_type = %entry.entry_type(),
            id = entry.id(),
            blocked,
            "{} from {}: {} <{}>",
            entry.entry_type(),
            entry.from().name(),
            entry.title(),
            entry.link()
        );
        Ok(())
    }

    async fn notify_invalid_credentials(&self, chat_id: i64) -> Result<()> {
        info!(chat_id, "Session cookies are no longer valid");
        Ok(())
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn KnownEntryStore>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, store: Arc<dyn KnownEntryStore>) -> Self {
        Self { notifier, store }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Sends one entry and remembers it as delivered.
    pub async fn deliver(&self, user_id: i64, chat_id: i64, entry: &Entry) -> Result<()> {
        self.notifier.notify_entry(chat_id, entry).await?;
        self.store
            .create(&KnownEntry {
                entry_type: entry.entry_type(),
                entry_id: entry.id(),
                user_id,
                notified_at: Utc::now(),
                sent_date: Some(entry.date()),
            })
            .await?;
        Ok(())
    }

    /// Delivers everything `entries` yields; returns how many went out.
    pub async fn deliver_all(
        &self,
        user_id: i64,
        chat_id: i64,
        mut entries: mpsc::Receiver<Entry>,
    ) -> usize {
        let mut delivered = 0;
        while let Some(entry) = entries.recv().await {
            match self.deliver(user_id, chat_id, &entry).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Failed to deliver {} {} to user {}: {}",
                    entry.entry_type(),
                    entry.id(),
                    user_id,
                    e
                ),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::{EntryType, FurAffinityUser, JournalEntry, NoteEntry};
    use crate::repositories::MemoryKnownEntryStore;
    use crate::site;
    use chrono::TimeZone;

    fn note(id: u64) -> Entry {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        NoteEntry::new(id, "hello", date, FurAffinityUser::unknown()).into()
    }

    #[tokio::test]
    async fn test_deliver_records_known_entry() {
        let store = Arc::new(MemoryKnownEntryStore::new());
        let dispatcher = Dispatcher::new(Arc::new(LogNotifier), store.clone());

        dispatcher.deliver(1, 42, &note(100)).await.unwrap();

        assert!(store.exists(EntryType::Note, 100, 1).await.unwrap());
        assert!(!store.exists(EntryType::Note, 100, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_notification_is_not_recorded() {
        let store = Arc::new(MemoryKnownEntryStore::new());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify_entry()
            .returning(|_, entry| match entry.id() {
                1 => Err(anyhow::anyhow!("chat unreachable")),
                _ => Ok(()),
            });
        let dispatcher = Dispatcher::new(Arc::new(notifier), store.clone());

        let (tx, rx) = mpsc::channel(4);
        tx.send(note(1)).await.unwrap();
        tx.send(note(2)).await.unwrap();
        drop(tx);

        assert_eq!(dispatcher.deliver_all(1, 42, rx).await, 1);
        assert!(!store.exists(EntryType::Note, 1, 1).await.unwrap());
        assert!(store.exists(EntryType::Note, 2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_log_notifier_accepts_every_entry() {
        let journal = JournalEntry::new(
            4321,
            "Life update",
            Utc::now(),
            FurAffinityUser::unknown(),
            site::path("/journal/4321/"),
        );
        assert!(LogNotifier.notify_entry(1, &journal.into()).await.is_ok());
        assert!(LogNotifier.notify_invalid_credentials(1).await.is_ok());
    }
}
