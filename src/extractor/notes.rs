//! Notes inbox listing.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::entries::{EntryType, FurAffinityUser, NoteEntry, username_from_profile_link};
use crate::extractor::text::{
    MESSAGE_DATE_LAYOUT, NOTE_DATE_LAYOUT, element_text, has_class, popup_date, trim_html_text,
};
use crate::extractor::{DateGate, ParseError};
use crate::site;

static NOTE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#notes-list .note-list-container").unwrap());
static SUBJECT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".note-list-subject").unwrap());
static UNREAD_ICON: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img.unread").unwrap());
static NOTE_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.notelink").unwrap());
static SEND_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".note-list-senddate").unwrap());
static POPUP_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.popup_date").unwrap());
static SENDER: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".note-list-sender").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static USERNAME_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".js-userName-block").unwrap());
static DISPLAY_NAME_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".js-displayName-block").unwrap());

/// Parses the first page of the notes inbox. Nodes that fail to parse or fail
/// the date gate are skipped.
pub fn parse_notes(html: &str, gate: &dyn DateGate) -> Vec<NoteEntry> {
    let document = Html::parse_document(html);
    document
        .select(&NOTE_CONTAINER)
        .filter_map(|node| match parse_note(node) {
            Ok(note) => Some(note),
            Err(e) => {
                debug!(error = %e, "skipping note node");
                None
            }
        })
        .filter(|note| gate.accepts(EntryType::Note, note.date))
        .collect()
}

fn parse_note(node: ElementRef<'_>) -> Result<NoteEntry, ParseError> {
    let subject = node.select(&SUBJECT).next();
    let title = subject
        .map(|s| trim_html_text(&element_text(s, &[])).to_string())
        .unwrap_or_default();
    let was_unread = has_class(&node, "unread")
        || subject.is_some_and(|s| s.select(&UNREAD_ICON).next().is_some());

    let anchor = node
        .select(&NOTE_LINK)
        .next()
        .ok_or(ParseError::MissingElement("a.notelink"))?;
    let href = anchor
        .value()
        .attr("href")
        .ok_or(ParseError::MissingAttribute("href"))?;
    let link = site::resolve(href)?;
    let id = note_id_from_path(link.path())?;

    let date_el = node
        .select(&SEND_DATE)
        .next()
        .ok_or(ParseError::MissingElement(".note-list-senddate"))?;
    let date_el = date_el.select(&POPUP_DATE).next().unwrap_or(date_el);
    let date = popup_date(date_el, &[NOTE_DATE_LAYOUT, MESSAGE_DATE_LAYOUT])?;

    let from = node
        .select(&SENDER)
        .next()
        .map(sender)
        .unwrap_or_else(FurAffinityUser::unknown);

    Ok(NoteEntry::new(id, title, date, from)
        .with_link(link)
        .with_unread(was_unread))
}

/// The id is the last non-empty path segment of the note permalink.
fn note_id_from_path(path: &str) -> Result<u64, ParseError> {
    let segment = path
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .ok_or_else(|| ParseError::InvalidId(path.to_string()))?;
    match segment.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ParseError::InvalidId(segment.to_string())),
    }
}

fn sender(el: ElementRef<'_>) -> FurAffinityUser {
    let mut user = FurAffinityUser::unknown();

    let profile_url = el
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| site::resolve(href).ok());

    let mut user_name = profile_url.as_ref().and_then(username_from_profile_link);
    if user_name.is_none() {
        user_name = el
            .select(&USERNAME_BLOCK)
            .next()
            .map(|b| {
                trim_html_text(&b.text().collect::<String>())
                    .trim_matches('~')
                    .to_lowercase()
            })
            .filter(|name| !name.is_empty());
    }

    if let Some(name) = user_name {
        user.profile_url = profile_url.or_else(|| site::resolve(&format!("/user/{name}/")).ok());
        user.user_name = name;
    } else {
        user.profile_url = profile_url;
    }

    user.display_name = el
        .select(&DISPLAY_NAME_BLOCK)
        .next()
        .map(|b| trim_html_text(&b.text().collect::<String>()).to_string())
        .unwrap_or_default();
    user
}
