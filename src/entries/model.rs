use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use tracing::warn;
use url::Url;

use crate::entries::{EntryType, FurAffinityUser, ThumbnailUrl};
use crate::site;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rating {
    #[default]
    General,
    Mature,
    Adult,
}

impl Rating {
    pub fn name(self) -> &'static str {
        match self {
            Rating::General => "General",
            Rating::Mature => "Mature",
            Rating::Adult => "Adult",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Rating::General => "\u{2B1C}",
            Rating::Mature => "\u{1F7E6}",
            Rating::Adult => "\u{1F7E5}",
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionType {
    #[default]
    Unknown,
    Image,
    Text,
}

impl Display for SubmissionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SubmissionType::Unknown => "Unknown",
            SubmissionType::Image => "Image",
            SubmissionType::Text => "Text",
        })
    }
}

/// Body of a note, comment or journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionContent {
    pub id: u64,
    pub description_text: String,
    /// Sanitised description markup.
    pub description_html: String,
    /// Full-size media; absent for text submissions.
    pub full_view: Option<Url>,
    pub thumbnail: Option<ThumbnailUrl>,
    /// Exact upload time from the submission page.
    pub date: DateTime<Utc>,
}

/// Per-submission metadata embedded as JSON in the submissions inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub lower: String,
}

#[derive(Debug, Clone)]
pub struct NoteEntry {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) date: DateTime<Utc>,
    pub(crate) from: FurAffinityUser,
    pub(crate) link: Url,
    pub(crate) was_unread: bool,
    pub(crate) content: Option<TextContent>,
}

impl NoteEntry {
    pub fn new(id: u64, title: impl Into<String>, date: DateTime<Utc>, from: FurAffinityUser) -> Self {
        Self {
            id,
            title: title.into(),
            date,
            from,
            link: site::note_link(id),
            was_unread: false,
            content: None,
        }
    }

    pub fn with_link(mut self, link: Url) -> Self {
        self.link = link;
        self
    }

    pub fn with_unread(mut self, was_unread: bool) -> Self {
        self.was_unread = was_unread;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the note was unread before it was opened for its content.
    pub fn was_unread(&self) -> bool {
        self.was_unread
    }

    pub fn content(&self) -> Option<&TextContent> {
        self.content.as_ref()
    }

    pub(crate) fn attach_content(&mut self, content: TextContent) {
        if self.content.is_some() {
            warn!("Content of note {} attached twice, keeping the first", self.id);
            return;
        }
        self.content = Some(content);
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionEntry {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) from: FurAffinityUser,
    pub(crate) rating: Rating,
    pub(crate) kind: SubmissionType,
    pub(crate) date: DateTime<Utc>,
    pub(crate) link: Url,
    pub(crate) thumbnail: Option<ThumbnailUrl>,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) blocked_reasons: BTreeSet<String>,
    pub(crate) data: Option<SubmissionData>,
    pub(crate) content: Option<SubmissionContent>,
}

impl SubmissionEntry {
    pub fn new(id: u64, title: impl Into<String>, date: DateTime<Utc>, from: FurAffinityUser) -> Self {
        Self {
            id,
            title: title.into(),
            from,
            rating: Rating::default(),
            kind: SubmissionType::default(),
            date,
            link: site::submission_link(id),
            thumbnail: None,
            tags: BTreeSet::new(),
            blocked_reasons: BTreeSet::new(),
            data: None,
            content: None,
        }
    }

    pub fn with_kind(mut self, kind: SubmissionType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_link(mut self, link: Url) -> Self {
        self.link = link;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &Url {
        &self.link
    }

    pub fn kind(&self) -> SubmissionType {
        self.kind
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    /// Listing date, or the exact upload time once content has been fetched.
    pub fn date(&self) -> DateTime<Utc> {
        self.content.as_ref().map_or(self.date, |c| c.date)
    }

    pub fn listing_date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn thumbnail(&self) -> Option<&ThumbnailUrl> {
        self.thumbnail.as_ref()
    }

    pub fn full_view(&self) -> Option<&Url> {
        self.content.as_ref().and_then(|c| c.full_view.as_ref())
    }

    pub fn description(&self) -> &str {
        if let Some(content) = &self.content {
            return &content.description_text;
        }
        self.data.as_ref().map_or("", |d| d.description.as_str())
    }

    pub fn submission_data(&self) -> Option<&SubmissionData> {
        self.data.as_ref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Tags that matched the blocklist. Blocked submissions are still
    /// delivered; consumers suppress previews for them.
    pub fn blocked_reasons(&self) -> &BTreeSet<String> {
        &self.blocked_reasons
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_reasons.is_empty()
    }

    pub fn content(&self) -> Option<&SubmissionContent> {
        self.content.as_ref()
    }

    pub(crate) fn set_blocked_reasons(&mut self, reasons: BTreeSet<String>) {
        self.blocked_reasons = reasons;
    }

    /// Merges the embedded page data; non-empty titles replace the caption text.
    pub(crate) fn merge_data(&mut self, data: SubmissionData) {
        if !data.title.is_empty() {
            self.title = data.title.clone();
        }
        self.data = Some(data);
    }

    pub(crate) fn attach_content(&mut self, content: SubmissionContent) {
        if self.content.is_some() {
            warn!("Content of submission {} attached twice, keeping the first", self.id);
            return;
        }
        self.content = Some(content);
    }
}

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub(crate) entry_type: EntryType,
    pub(crate) id: u64,
    pub(crate) date: DateTime<Utc>,
    pub(crate) link: Url,
    pub(crate) from: FurAffinityUser,
    /// Title of the submission or journal that was commented on.
    pub(crate) title: String,
    pub(crate) content: Option<TextContent>,
}

impl CommentEntry {
    /// # Panics
    /// If `entry_type` is not one of the comment types.
    pub fn new(
        entry_type: EntryType,
        id: u64,
        title: impl Into<String>,
        date: DateTime<Utc>,
        from: FurAffinityUser,
        link: Url,
    ) -> Self {
        assert!(entry_type.is_comment(), "{entry_type} is not a comment type");
        Self {
            entry_type,
            id,
            date,
            link,
            from,
            title: title.into(),
            content: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content(&self) -> Option<&TextContent> {
        self.content.as_ref()
    }

    pub(crate) fn attach_content(&mut self, content: TextContent) {
        if self.content.is_some() {
            warn!("Content of comment {} attached twice, keeping the first", self.id);
            return;
        }
        self.content = Some(content);
    }
}

#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) from: FurAffinityUser,
    pub(crate) date: DateTime<Utc>,
    pub(crate) link: Url,
    pub(crate) content: Option<TextContent>,
}

impl JournalEntry {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        date: DateTime<Utc>,
        from: FurAffinityUser,
        link: Url,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            from,
            date,
            link,
            content: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content(&self) -> Option<&TextContent> {
        self.content.as_ref()
    }

    pub(crate) fn attach_content(&mut self, content: TextContent) {
        if self.content.is_some() {
            warn!("Content of journal {} attached twice, keeping the first", self.id);
            return;
        }
        self.content = Some(content);
    }
}

/// Borrowed view of whatever content an entry carries.
#[derive(Debug, Clone, Copy)]
pub enum EntryContent<'a> {
    Text(&'a TextContent),
    Submission(&'a SubmissionContent),
}

impl EntryContent<'_> {
    pub fn id(&self) -> u64 {
        match self {
            EntryContent::Text(c) => c.id,
            EntryContent::Submission(c) => c.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            EntryContent::Text(c) => &c.text,
            EntryContent::Submission(c) => &c.description_text,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Entry {
    Note(NoteEntry),
    Submission(SubmissionEntry),
    Comment(CommentEntry),
    Journal(JournalEntry),
}

impl Entry {
    pub fn entry_type(&self) -> EntryType {
        match self {
            Entry::Note(_) => EntryType::Note,
            Entry::Submission(_) => EntryType::Submission,
            Entry::Comment(c) => c.entry_type,
            Entry::Journal(_) => EntryType::Journal,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Entry::Note(n) => n.id,
            Entry::Submission(s) => s.id,
            Entry::Comment(c) => c.id,
            Entry::Journal(j) => j.id,
        }
    }

    /// Best known timestamp of the entry.
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Entry::Note(n) => n.date,
            Entry::Submission(s) => s.date(),
            Entry::Comment(c) => c.date,
            Entry::Journal(j) => j.date,
        }
    }

    pub fn link(&self) -> &Url {
        match self {
            Entry::Note(n) => &n.link,
            Entry::Submission(s) => &s.link,
            Entry::Comment(c) => &c.link,
            Entry::Journal(j) => &j.link,
        }
    }

    pub fn from(&self) -> &FurAffinityUser {
        match self {
            Entry::Note(n) => &n.from,
            Entry::Submission(s) => &s.from,
            Entry::Comment(c) => &c.from,
            Entry::Journal(j) => &j.from,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Entry::Note(n) => &n.title,
            Entry::Submission(s) => &s.title,
            Entry::Comment(c) => &c.title,
            Entry::Journal(j) => &j.title,
        }
    }

    pub fn rating(&self) -> Rating {
        match self {
            Entry::Submission(s) => s.rating,
            _ => Rating::General,
        }
    }

    pub fn content(&self) -> Option<EntryContent<'_>> {
        match self {
            Entry::Note(n) => n.content.as_ref().map(EntryContent::Text),
            Entry::Submission(s) => s.content.as_ref().map(EntryContent::Submission),
            Entry::Comment(c) => c.content.as_ref().map(EntryContent::Text),
            Entry::Journal(j) => j.content.as_ref().map(EntryContent::Text),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content().is_some()
    }

    pub fn as_submission(&self) -> Option<&SubmissionEntry> {
        match self {
            Entry::Submission(s) => Some(s),
            _ => None,
        }
    }
}

impl From<NoteEntry> for Entry {
    fn from(value: NoteEntry) -> Self {
        Entry::Note(value)
    }
}

impl From<SubmissionEntry> for Entry {
    fn from(value: SubmissionEntry) -> Self {
        Entry::Submission(value)
    }
}

impl From<CommentEntry> for Entry {
    fn from(value: CommentEntry) -> Self {
        Entry::Comment(value)
    }
}

impl From<JournalEntry> for Entry {
    fn from(value: JournalEntry) -> Self {
        Entry::Journal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn author() -> FurAffinityUser {
        FurAffinityUser {
            display_name: "Artist".into(),
            user_name: "artist".into(),
            profile_url: None,
        }
    }

    #[test]
    fn test_submission_date_prefers_content_date() {
        let listing = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let exact = Utc.with_ymd_and_hms(2025, 3, 1, 14, 30, 0).unwrap();
        let mut submission = SubmissionEntry::new(7, "Title", listing, author());
        assert_eq!(submission.date(), listing);

        submission.attach_content(SubmissionContent {
            id: 7,
            description_text: "desc".into(),
            description_html: "<p>desc</p>".into(),
            full_view: None,
            thumbnail: None,
            date: exact,
        });
        let entry = Entry::Submission(submission);
        assert_eq!(entry.date(), exact);
        assert_eq!(entry.content().map(|c| c.text().to_string()), Some("desc".into()));
    }

    #[test]
    fn test_content_is_attached_once() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let mut note = NoteEntry::new(3, "Hello", date, author());
        note.attach_content(TextContent {
            id: 3,
            text: "first".into(),
        });
        note.attach_content(TextContent {
            id: 3,
            text: "second".into(),
        });
        assert_eq!(note.content().map(|c| c.text.as_str()), Some("first"));
    }

    #[test]
    fn test_description_falls_back_to_page_data() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let mut submission = SubmissionEntry::new(7, "Caption", date, author());
        submission.merge_data(SubmissionData {
            title: "Real Title".into(),
            description: "From JSON".into(),
            ..Default::default()
        });
        assert_eq!(submission.description(), "From JSON");
        assert_eq!(Entry::Submission(submission).title(), "Real Title");
    }

    #[test]
    fn test_comment_entry_keeps_its_subtype() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let link = Url::parse("https://www.furaffinity.net/journal/5/#cid:9").unwrap();
        let entry: Entry =
            CommentEntry::new(EntryType::JournalComment, 9, "Journal", date, author(), link).into();
        assert_eq!(entry.entry_type(), EntryType::JournalComment);
        assert_eq!(entry.rating(), Rating::General);
        assert!(!entry.has_content());
    }

    #[test]
    #[should_panic]
    fn test_comment_entry_rejects_non_comment_type() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let link = Url::parse("https://www.furaffinity.net/view/1/").unwrap();
        let _ = CommentEntry::new(EntryType::Note, 1, "x", date, author(), link);
    }
}
