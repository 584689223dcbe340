//! Detail pages: note bodies, submission pages, comments and journals.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::warn;

use crate::entries::{SubmissionContent, SubmissionEntry, SubmissionType, TextContent};
use crate::extractor::ParseError;
use crate::extractor::text::{element_text, inner_html_without, parse_epoch, trim_html_text};
use crate::site;

/// Separates a note body from the quoted conversation below it.
pub const NOTE_SEPARATOR: &str = "—————————";

static NOTE_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#message .section-body").unwrap());
static NOTE_WARNING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".noteWarningMessage").unwrap());
static SECTION_OPTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".section-options").unwrap());

static SUBMISSION_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".submission-content").unwrap());
static FULL_VIEW_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".submission-image img").unwrap());
static SUBMISSION_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".submission-id-container span.popup_date").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".submission-description").unwrap());
static SUBMISSION_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".submission-header").unwrap());
static SUBMISSION_FOOTER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".submission-footer").unwrap());
static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script, style").unwrap());

static WITH_ID: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[id]").unwrap());
static COMMENT_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".comment-content .comment_text").unwrap());

static JOURNAL_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#site-content .journal-content").unwrap());

pub fn parse_note_content(html: &str, id: u64) -> Result<TextContent, ParseError> {
    let document = Html::parse_document(html);
    let body = document
        .select(&NOTE_BODY)
        .next()
        .ok_or(ParseError::MissingElement("#message .section-body"))?;

    let text = element_text(body, &[&*NOTE_WARNING, &*SECTION_OPTIONS]);
    let text = trim_html_text(&text);
    let text = text.split(NOTE_SEPARATOR).next().unwrap_or_default();

    Ok(TextContent {
        id,
        text: trim_html_text(text).to_string(),
    })
}

pub fn parse_submission_content(
    html: &str,
    entry: &SubmissionEntry,
) -> Result<SubmissionContent, ParseError> {
    let document = Html::parse_document(html);
    let content = document
        .select(&SUBMISSION_CONTENT)
        .next()
        .ok_or(ParseError::MissingElement(".submission-content"))?;

    let full_view = match content
        .select(&FULL_VIEW_IMG)
        .next()
        .and_then(|img| img.value().attr("data-fullview-src"))
        .filter(|src| !src.is_empty())
    {
        Some(src) => Some(site::resolve(src)?),
        None if entry.kind() == SubmissionType::Image => {
            return Err(ParseError::MissingAttribute("data-fullview-src"));
        }
        None => None,
    };

    let date = content
        .select(&SUBMISSION_DATE)
        .next()
        .and_then(|el| el.value().attr("data-time"))
        .ok_or(ParseError::MissingAttribute("data-time"))
        .and_then(parse_epoch)?;

    let description = content
        .select(&DESCRIPTION)
        .next()
        .ok_or(ParseError::MissingElement(".submission-description"))?;
    let skip = [&*SUBMISSION_HEADER, &*SUBMISSION_FOOTER, &*SCRIPT];
    let description_text = trim_html_text(&element_text(description, &skip)).to_string();
    if description_text.is_empty() {
        warn!(id = entry.id(), "empty submission description");
    }
    let description_html = ammonia::clean(&inner_html_without(description, &skip));

    Ok(SubmissionContent {
        id: entry.id(),
        description_text,
        description_html,
        full_view,
        thumbnail: entry.thumbnail().cloned(),
        date,
    })
}

/// `anchor` is the fragment of the comment link, e.g. `cid:123`.
pub fn parse_comment_content(html: &str, id: u64, anchor: &str) -> Result<TextContent, ParseError> {
    let document = Html::parse_document(html);
    let marker = document
        .select(&WITH_ID)
        .find(|el| el.value().id() == Some(anchor))
        .ok_or(ParseError::MissingElement("comment anchor"))?;
    let container = marker
        .parent()
        .and_then(scraper::ElementRef::wrap)
        .ok_or(ParseError::MissingElement("comment container"))?;
    let comment = container
        .select(&COMMENT_TEXT)
        .next()
        .ok_or(ParseError::MissingElement(".comment_text"))?;

    let text = trim_html_text(&element_text(comment, &[])).to_string();
    if text.is_empty() {
        return Err(ParseError::EmptyContent);
    }
    Ok(TextContent { id, text })
}

pub fn parse_journal_content(html: &str, id: u64) -> Result<TextContent, ParseError> {
    let document = Html::parse_document(html);
    let body = document
        .select(&JOURNAL_CONTENT)
        .next()
        .ok_or(ParseError::MissingElement(".journal-content"))?;

    let text = trim_html_text(&element_text(body, &[])).to_string();
    if text.is_empty() {
        return Err(ParseError::EmptyContent);
    }
    Ok(TextContent { id, text })
}
