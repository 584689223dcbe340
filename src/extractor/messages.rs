//! The "other notifications" page: submission comments, journal comments and journals.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::entries::{CommentEntry, Entry, EntryType, FurAffinityUser, JournalEntry, username_from_profile_link};
use crate::extractor::text::{MESSAGE_DATE_LAYOUT, popup_date, trim_html_text};
use crate::extractor::{DateGate, ParseError};
use crate::site;

static SUBMISSION_COMMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#messages-comments-submission").unwrap());
static JOURNAL_COMMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#messages-comments-journal").unwrap());
static JOURNALS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#messages-journals").unwrap());
static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static POPUP_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.popup_date").unwrap());

static JOURNAL_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*/journal/(\d+)/*").unwrap());

const COMMENT_FRAGMENT_PREFIX: &str = "cid:";

/// Fields every message item carries.
struct Message {
    title: String,
    from: FurAffinityUser,
    date: DateTime<Utc>,
    link: Url,
}

fn section_selector(entry_type: EntryType) -> Option<&'static Selector> {
    match entry_type {
        EntryType::SubmissionComment => Some(&*SUBMISSION_COMMENTS),
        EntryType::JournalComment => Some(&*JOURNAL_COMMENTS),
        EntryType::Journal => Some(&*JOURNALS),
        _ => None,
    }
}

/// Parses the requested entry types from the page. Types without a section on
/// this page are ignored.
pub fn parse_others(html: &str, entry_types: &[EntryType], gate: &dyn DateGate) -> Vec<Entry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for &entry_type in EntryType::valid_entry_types() {
        if !entry_types.contains(&entry_type) {
            continue;
        }
        let Some(selector) = section_selector(entry_type) else {
            continue;
        };
        for section in document.select(selector) {
            for item in section.select(&ITEM) {
                let parsed = match entry_type {
                    EntryType::Journal => parse_journal(item).map(Entry::Journal),
                    _ => parse_comment(entry_type, item).map(Entry::Comment),
                };
                match parsed {
                    Ok(entry) if gate.accepts(entry.entry_type(), entry.date()) => {
                        entries.push(entry)
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, entry_type = %entry_type, "skipping message node"),
                }
            }
        }
    }

    entries
}

fn parse_message(entry_type: EntryType, item: ElementRef<'_>) -> Result<Message, ParseError> {
    let (author_index, title_index) = match entry_type {
        EntryType::Journal => (1, 0),
        _ => (0, 1),
    };
    let anchors: Vec<ElementRef<'_>> = item.select(&ANCHOR).take(2).collect();

    let author = anchors
        .get(author_index)
        .ok_or(ParseError::MissingElement("author link"))?;
    let profile_url = site::resolve(
        author
            .value()
            .attr("href")
            .ok_or(ParseError::MissingAttribute("href"))?,
    )?;
    let user_name = username_from_profile_link(&profile_url)
        .ok_or_else(|| ParseError::InvalidUsername(profile_url.to_string()))?;
    let from = FurAffinityUser {
        display_name: trim_html_text(&author.text().collect::<String>()).to_string(),
        user_name,
        profile_url: Some(profile_url),
    };

    let target = anchors
        .get(title_index)
        .ok_or(ParseError::MissingElement("title link"))?;
    let link = site::resolve(
        target
            .value()
            .attr("href")
            .ok_or(ParseError::MissingAttribute("href"))?,
    )?;
    let title = trim_html_text(&target.text().collect::<String>()).to_string();

    let date_el = item
        .select(&POPUP_DATE)
        .next()
        .ok_or(ParseError::MissingElement("span.popup_date"))?;
    let date = popup_date(date_el, &[MESSAGE_DATE_LAYOUT])?;

    Ok(Message {
        title,
        from,
        date,
        link,
    })
}

fn parse_comment(entry_type: EntryType, item: ElementRef<'_>) -> Result<CommentEntry, ParseError> {
    let msg = parse_message(entry_type, item)?;
    let id = comment_id_from_fragment(msg.link.fragment().unwrap_or_default())?;
    Ok(CommentEntry::new(entry_type, id, msg.title, msg.date, msg.from, msg.link))
}

fn parse_journal(item: ElementRef<'_>) -> Result<JournalEntry, ParseError> {
    let msg = parse_message(EntryType::Journal, item)?;
    let id = journal_id_from_link(&msg.link)?;
    Ok(JournalEntry::new(id, msg.title, msg.date, msg.from, msg.link))
}

pub fn comment_id_from_fragment(fragment: &str) -> Result<u64, ParseError> {
    let raw = fragment.strip_prefix(COMMENT_FRAGMENT_PREFIX).unwrap_or(fragment);
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ParseError::InvalidId(fragment.to_string())),
    }
}

pub fn journal_id_from_link(link: &Url) -> Result<u64, ParseError> {
    let raw = JOURNAL_ID_REGEX
        .captures(link.path())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ParseError::InvalidId(link.path().to_string()))?;
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ParseError::InvalidId(raw.to_string())),
    }
}
