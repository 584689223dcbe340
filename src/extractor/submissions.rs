//! Submissions inbox listing.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

use crate::entries::{
    EntryType, FurAffinityUser, Rating, SubmissionData, SubmissionEntry, SubmissionType,
    ThumbnailUrl, username_from_profile_link,
};
use crate::extractor::text::{element_text, has_class, parse_epoch, tag_set, trim_html_text};
use crate::extractor::{DateGate, ParseError};
use crate::site;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static SUBMISSION_DATA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#js-submissionData").unwrap());
static SECTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#messagecenter-submissions .notifications-by-date").unwrap()
});
static FIGURE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("figure").unwrap());
static CAPTION_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("figcaption a").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

static SUBMISSION_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*/view/(\d*)/*").unwrap());

/// Result of parsing one submissions inbox page.
#[derive(Debug, Default)]
pub struct SubmissionListing {
    /// Entries in page order (newest first).
    pub entries: Vec<SubmissionEntry>,
    /// The account's tag blocklist, lower-cased.
    pub blocked_tags: BTreeSet<String>,
}

pub fn parse_submissions(html: &str, gate: &dyn DateGate) -> SubmissionListing {
    let document = Html::parse_document(html);

    let blocked_tags = document
        .select(&BODY)
        .next()
        .and_then(|body| body.value().attr("data-tag-blocklist"))
        .map(tag_set)
        .unwrap_or_default();

    let mut data = document
        .select(&SUBMISSION_DATA)
        .next()
        .map(|el| parse_submission_data(&el.text().collect::<String>()))
        .unwrap_or_default();

    let mut entries = Vec::new();
    for section in document.select(&SECTION) {
        let date = match section.value().attr("data-date").map(parse_epoch) {
            Some(Ok(date)) => date,
            other => {
                warn!(result = ?other, "invalid submission section date");
                DateTime::<Utc>::UNIX_EPOCH
            }
        };
        if !gate.accepts(EntryType::Submission, date) {
            continue;
        }

        for figure in section.select(&FIGURE) {
            match parse_figure(figure, date) {
                Ok(mut entry) => {
                    if let Some(d) = data.remove(&entry.id) {
                        entry.merge_data(d);
                    }
                    entries.push(entry);
                }
                Err(e) => debug!(error = %e, "skipping submission node"),
            }
        }
    }

    SubmissionListing {
        entries,
        blocked_tags,
    }
}

fn parse_figure(figure: ElementRef<'_>, date: DateTime<Utc>) -> Result<SubmissionEntry, ParseError> {
    let kind = if has_class(&figure, "t-image") {
        SubmissionType::Image
    } else if has_class(&figure, "t-text") {
        SubmissionType::Text
    } else {
        SubmissionType::Unknown
    };

    let rating = if has_class(&figure, "r-mature") {
        Rating::Mature
    } else if has_class(&figure, "r-adult") {
        Rating::Adult
    } else {
        Rating::General
    };

    let mut anchors = figure.select(&CAPTION_ANCHOR);

    let title_anchor = anchors
        .next()
        .ok_or(ParseError::MissingElement("figcaption a"))?;
    let mut title = trim_html_text(&element_text(title_anchor, &[])).to_string();
    if title.is_empty() {
        title = title_anchor.value().attr("title").unwrap_or_default().to_string();
    }
    let href = title_anchor
        .value()
        .attr("href")
        .ok_or(ParseError::MissingAttribute("href"))?;
    let id = submission_id_from_link(&site::resolve(href)?)?;

    let from = anchors.next().map(author).unwrap_or_else(FurAffinityUser::unknown);

    let img = figure.select(&IMG).next();
    let tags = img
        .and_then(|i| i.value().attr("data-tags"))
        .map(tag_set)
        .unwrap_or_default();

    let mut entry = SubmissionEntry::new(id, title, date, from)
        .with_kind(kind)
        .with_rating(rating)
        .with_tags(tags);
    entry.thumbnail = img.and_then(thumbnail);
    Ok(entry)
}

fn author(anchor: ElementRef<'_>) -> FurAffinityUser {
    let mut user = FurAffinityUser::unknown();
    user.display_name = trim_html_text(&anchor.text().collect::<String>()).to_string();
    user.profile_url = anchor
        .value()
        .attr("href")
        .filter(|href| !href.is_empty())
        .and_then(|href| site::resolve(href).ok());
    match user.profile_url.as_ref().and_then(username_from_profile_link) {
        Some(name) => user.user_name = name,
        None => debug!(display_name = %user.display_name, "no username in submission author link"),
    }
    user
}

fn thumbnail(img: ElementRef<'_>) -> Option<ThumbnailUrl> {
    let src = img.value().attr("src").filter(|s| !s.is_empty())?;
    match site::resolve(src) {
        Ok(url) => Some(ThumbnailUrl::new(url)),
        Err(e) => {
            warn!(error = %e, src, "invalid thumbnail url");
            None
        }
    }
}

pub fn submission_id_from_link(link: &Url) -> Result<u64, ParseError> {
    let raw = SUBMISSION_ID_REGEX
        .captures(link.path())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ParseError::InvalidId(link.path().to_string()))?;
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ParseError::InvalidId(raw.to_string())),
    }
}

/// Parses the `#js-submissionData` blob. Keys are submission ids; titles and
/// descriptions are unescaped and trimmed.
pub fn parse_submission_data(raw: &str) -> HashMap<u64, SubmissionData> {
    let parsed: HashMap<String, SubmissionData> = match serde_json::from_str(raw.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "invalid submission data");
            return HashMap::new();
        }
    };

    parsed
        .into_iter()
        .filter_map(|(key, mut data)| {
            let id = match key.parse::<u64>() {
                Ok(id) => id,
                Err(_) => {
                    warn!(key = %key, "invalid submission id in submission data");
                    return None;
                }
            };
            data.title = html_escape::decode_html_entities(&data.title).trim().to_string();
            data.description = html_escape::decode_html_entities(&data.description)
                .trim()
                .to_string();
            Some((id, data))
        })
        .collect()
}
