//! Per-user collection of new entries.
//!
//! A pass runs listing → novelty → whitelist/blocklist → content pool, each
//! stage a task connected to the next by a bounded channel.

pub mod filter;
pub mod novelty;
pub mod ordering;
pub mod pool;
pub mod session;

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::entries::{Entry, EntryType};
use crate::extractor::{self, ParseError};
use crate::fetcher::{DocumentFetcher, FetchError};
use crate::repositories::KnownEntryStore;
use crate::site;

pub use filter::{UserFilters, blocked_reasons, parse_user_list};
pub use novelty::is_new;
pub use ordering::reverse_stream;
pub use pool::run_content_pool;
pub use session::{CollectorSession, CollectorSettings};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("listing fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("collection cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
enum ContentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// One listing page of the site and the entry types it yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Notes,
    Submissions,
    /// The "other" notifications page, restricted to the given types.
    Others(Vec<EntryType>),
}

impl Surface {
    /// Surfaces to visit for a set of enabled types, notes first.
    pub fn for_types(types: &[EntryType]) -> Vec<Surface> {
        let mut surfaces = Vec::new();
        if types.contains(&EntryType::Note) {
            surfaces.push(Surface::Notes);
        }
        if types.contains(&EntryType::Submission) {
            surfaces.push(Surface::Submissions);
        }
        let others: Vec<EntryType> = types
            .iter()
            .copied()
            .filter(|t| matches!(t, EntryType::SubmissionComment | EntryType::Journal | EntryType::JournalComment))
            .collect();
        if !others.is_empty() {
            surfaces.push(Surface::Others(others));
        }
        surfaces
    }

    fn path(&self) -> &'static str {
        match self {
            Surface::Notes => site::NOTES_PATH,
            Surface::Submissions => site::SUBMISSIONS_PATH,
            Surface::Others(_) => site::OTHERS_PATH,
        }
    }
}

/// Collects new entries for one user.
#[derive(Clone)]
pub struct Collector {
    fetcher: Arc<dyn DocumentFetcher>,
    store: Arc<dyn KnownEntryStore>,
    session: Arc<CollectorSession>,
    cancel: CancellationToken,
}

impl Collector {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        store: Arc<dyn KnownEntryStore>,
        session: CollectorSession,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            store,
            session: Arc::new(session),
            cancel,
        }
    }

    pub fn session(&self) -> &CollectorSession {
        &self.session
    }

    /// Whether the session cookies still belong to a logged in account.
    #[instrument(skip_all, fields(user = self.session.user_id()))]
    pub async fn is_logged_in(&self) -> Result<bool, CollectError> {
        let url = site::path(site::SETTINGS_PATH);
        match self.fetcher.fetch(&url, self.session.cookies()).await {
            Ok(page) => Ok(extractor::is_logged_in_page(&page.body_utf8)),
            Err(FetchError::Http { status, .. })
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// New, filtered entry summaries of one surface, without content.
    pub async fn new_entries(&self, surface: Surface) -> Result<mpsc::Receiver<Entry>, CollectError> {
        if self.cancel.is_cancelled() {
            return Err(CollectError::Cancelled);
        }

        let url = site::path(surface.path());
        let cookies = match surface {
            Surface::Notes => self.session.note_cookies(),
            _ => self.session.cookies().clone(),
        };
        let page = self.fetcher.fetch(&url, &cookies).await?;

        let (entries, blocked) = self.parse_listing(&surface, &page.body_utf8);
        info!("Found {} entries on {}", entries.len(), url);

        let (tx, listing) = mpsc::channel(site::LISTING_PAGE_CAPACITY);
        tokio::spawn(async move {
            for entry in entries {
                if tx.send(entry).await.is_err() {
                    break;
                }
            }
        });

        let listing = if surface == Surface::Submissions && self.session.iterate_backwards() {
            reverse_stream(listing, site::LISTING_PAGE_CAPACITY)
        } else {
            listing
        };

        let novel = self.novelty_stage(listing);
        Ok(self.filter_stage(novel, blocked))
    }

    /// New entries of one surface with their content attached.
    ///
    /// The stream closes once every content fetch finished and, for notes,
    /// the notes that were unread have been marked unread again.
    pub async fn new_entries_with_content(
        &self,
        surface: Surface,
    ) -> Result<mpsc::Receiver<Entry>, CollectError> {
        let summaries = self.new_entries(surface).await?;
        let (tx, rx) = mpsc::channel(site::LISTING_PAGE_CAPACITY);

        let this = self.clone();
        tokio::spawn(async move {
            let fetcher = this.fetcher.clone();
            let session = this.session.clone();
            let unread = run_content_pool(
                summaries,
                &tx,
                session.limit_concurrency(),
                &this.cancel,
                move |entry| with_content(fetcher.clone(), session.clone(), entry),
            )
            .await;
            this.mark_unread(&unread).await;
            drop(tx);
        });

        Ok(rx)
    }

    fn parse_listing(&self, surface: &Surface, html: &str) -> (Vec<Entry>, BTreeSet<String>) {
        let gate = self.session.as_ref();
        match surface {
            Surface::Notes => (
                extractor::parse_notes(html, gate)
                    .into_iter()
                    .map(Entry::Note)
                    .collect(),
                BTreeSet::new(),
            ),
            Surface::Submissions => {
                let listing = extractor::parse_submissions(html, gate);
                (
                    listing.entries.into_iter().map(Entry::Submission).collect(),
                    listing.blocked_tags,
                )
            }
            Surface::Others(types) => (extractor::parse_others(html, types, gate), BTreeSet::new()),
        }
    }

    fn novelty_stage(&self, mut input: mpsc::Receiver<Entry>) -> mpsc::Receiver<Entry> {
        let (tx, rx) = mpsc::channel(site::LISTING_PAGE_CAPACITY);
        let store = self.store.clone();
        let user_id = self.session.user_id();
        tokio::spawn(async move {
            while let Some(entry) = input.recv().await {
                if !is_new(store.as_ref(), entry.entry_type(), entry.id(), user_id).await {
                    debug!("Skipping known {} {}", entry.entry_type(), entry.id());
                    continue;
                }
                if tx.send(entry).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn filter_stage(
        &self,
        mut input: mpsc::Receiver<Entry>,
        blocked: BTreeSet<String>,
    ) -> mpsc::Receiver<Entry> {
        let (tx, rx) = mpsc::channel(site::LISTING_PAGE_CAPACITY);
        let session = self.session.clone();
        tokio::spawn(async move {
            while let Some(mut entry) = input.recv().await {
                if !session.is_whitelisted(entry.entry_type(), &entry.from().user_name) {
                    debug!(
                        "Skipping {} {} from {}, not whitelisted",
                        entry.entry_type(),
                        entry.id(),
                        entry.from().user_name
                    );
                    continue;
                }
                if session.respect_blocked_tags()
                    && let Entry::Submission(submission) = &mut entry
                {
                    let reasons = blocked_reasons(submission.tags(), &blocked);
                    submission.set_blocked_reasons(reasons);
                }
                if tx.send(entry).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    async fn mark_unread(&self, ids: &[u64]) {
        if ids.is_empty() {
            return;
        }
        let mut form = vec![
            ("manage_notes".to_string(), "1".to_string()),
            ("move_to".to_string(), "unread".to_string()),
        ];
        form.extend(ids.iter().map(|id| ("items[]".to_string(), id.to_string())));

        let url = site::path(site::NOTES_PATH);
        match self.fetcher.post_form(&url, &self.session.note_cookies(), &form).await {
            Ok(()) => debug!("Marked {} notes unread", ids.len()),
            Err(e) => warn!("Failed to mark notes {:?} unread: {}", ids, e),
        }
    }
}

/// Fetches and attaches the content of `entry`. `None` when the fetch
/// failed or the submission's precise date no longer passes the date gate.
async fn with_content(
    fetcher: Arc<dyn DocumentFetcher>,
    session: Arc<CollectorSession>,
    mut entry: Entry,
) -> Option<Entry> {
    let (entry_type, id) = (entry.entry_type(), entry.id());
    if let Err(e) = attach_content(fetcher.as_ref(), &session, &mut entry).await {
        warn!("Failed to fetch content of {} {}: {}", entry_type, id, e);
        return None;
    }

    if let Entry::Submission(submission) = &entry
        && !session.date_is_valid(entry_type, submission.date())
    {
        debug!("Dropping {} {}, posted {}", entry_type, id, submission.date());
        return None;
    }
    Some(entry)
}

async fn attach_content(
    fetcher: &dyn DocumentFetcher,
    session: &CollectorSession,
    entry: &mut Entry,
) -> Result<(), ContentError> {
    let link = entry.link().clone();
    let cookies = match entry {
        Entry::Note(_) => session.note_cookies(),
        _ => session.cookies().clone(),
    };
    let page = fetcher.fetch(&link, &cookies).await?;
    let html = page.body_utf8.as_str();

    match entry {
        Entry::Note(note) => {
            let content = extractor::parse_note_content(html, note.id())?;
            note.attach_content(content);
        }
        Entry::Submission(submission) => {
            let content = extractor::parse_submission_content(html, submission)?;
            submission.attach_content(content);
        }
        Entry::Comment(comment) => {
            let anchor = link.fragment().unwrap_or_default();
            let content = extractor::parse_comment_content(html, comment.id(), anchor)?;
            comment.attach_content(content);
        }
        Entry::Journal(journal) => {
            let content = extractor::parse_journal_content(html, journal.id())?;
            journal.attach_content(content);
        }
    }
    Ok(())
}
