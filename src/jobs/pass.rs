use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::{CollectError, Collector, CollectorSession, CollectorSettings, Surface};
use crate::config::Config;
use crate::entities::User;
use crate::fetcher::DocumentFetcher;
use crate::notify::{Dispatcher, Notifier};
use crate::repositories::{KnownEntryStore, UserDirectory};

/// Runs one collection pass for a single user and delivers what it finds.
pub struct Updater {
    fetcher: Arc<dyn DocumentFetcher>,
    store: Arc<dyn KnownEntryStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    dispatcher: Dispatcher,
    settings: CollectorSettings,
    login_check: bool,
}

impl Updater {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        store: Arc<dyn KnownEntryStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(notifier.clone(), store.clone()),
            fetcher,
            store,
            users,
            notifier,
            settings: config.collector().clone(),
            login_check: config.enable_login_check(),
        }
    }

    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    /// Collects and delivers every new entry of the user's enabled types.
    /// Returns the number of delivered entries.
    pub async fn update_for_user(&self, user: &User, cancel: &CancellationToken) -> Result<usize> {
        if cancel.is_cancelled() {
            return Ok(0);
        }

        let session = CollectorSession::from_user(user, &self.settings);
        let collector = Collector::new(
            self.fetcher.clone(),
            self.store.clone(),
            session,
            cancel.clone(),
        );

        if self.login_check {
            self.check_credentials(user, &collector).await?;
        }

        let mut delivered = 0;
        for surface in Surface::for_types(&user.enabled_entry_types()) {
            let entries = match collector.new_entries_with_content(surface.clone()).await {
                Ok(entries) => entries,
                Err(CollectError::Cancelled) => {
                    debug!("Pass cancelled before {:?}", surface);
                    break;
                }
                Err(e) => {
                    warn!("Failed to collect {:?} for user {}: {}", surface, user.id, e);
                    continue;
                }
            };
            delivered += self
                .dispatcher
                .deliver_all(user.id, user.chat_id, entries)
                .await;
        }

        info!("Delivered {} entries to user {}", delivered, user.id);
        Ok(delivered)
    }

    /// Fails with [`CollectError::NotLoggedIn`] when the cookies are no longer
    /// valid. The user is told once until a later check passes again.
    async fn check_credentials(&self, user: &User, collector: &Collector) -> Result<()> {
        if collector.is_logged_in().await? {
            if user.invalid_credentials_sent_at.is_some() {
                self.users
                    .set_invalid_credentials_sent_at(user.id, None)
                    .await?;
            }
            return Ok(());
        }

        if user.invalid_credentials_sent_at.is_none() {
            self.notifier.notify_invalid_credentials(user.chat_id).await?;
            self.users
                .set_invalid_credentials_sent_at(user.id, Some(Utc::now()))
                .await?;
        }
        Err(CollectError::NotLoggedIn.into())
    }
}
