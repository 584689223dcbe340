//! Text, markup and date helpers shared by the page parsers.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use scraper::{ElementRef, Node, Selector};

use crate::extractor::errors::ParseError;
use crate::site;

/// Layout of human-readable dates in the notes inbox, e.g. `Mar 4, 2025 09:15PM`.
pub const NOTE_DATE_LAYOUT: &str = "%b %d, %Y %I:%M%p";
/// Layout of human-readable dates on the other notifications page,
/// e.g. `March 4, 2025 09:15:30 PM`.
pub const MESSAGE_DATE_LAYOUT: &str = "%B %d, %Y %I:%M:%S %p";

pub fn trim_html_text(s: &str) -> &str {
    s.trim_matches(|c: char| c == '\n' || c == '\r' || c == ' ' || c == '\t')
}

pub fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Concatenated text of `el`, skipping subtrees matched by `skip`.
/// Shortened `auto_link` anchors contribute their full target instead of their label.
pub fn element_text(el: ElementRef<'_>, skip: &[&Selector]) -> String {
    let mut out = String::new();
    collect_text(el, skip, &mut out);
    out
}

fn collect_text(el: ElementRef<'_>, skip: &[&Selector], out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip.iter().any(|s| s.matches(&child_el)) {
                    continue;
                }
                if element.name() == "a"
                    && element.classes().any(|c| c == "auto_link")
                    && let Some(href) = element.attr("href")
                {
                    out.push_str(href);
                    continue;
                }
                collect_text(child_el, skip, out);
            }
            _ => {}
        }
    }
}

/// Inner markup of `el` without the subtrees matched by `skip`.
pub fn inner_html_without(el: ElementRef<'_>, skip: &[&Selector]) -> String {
    let mut out = String::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child)
                    && !skip.iter().any(|s| s.matches(&child_el))
                {
                    out.push_str(&child_el.html());
                }
            }
            _ => {}
        }
    }
    out
}

pub fn parse_epoch(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidDate(raw.to_string()))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| ParseError::InvalidDate(raw.to_string()))
}

/// Parses a date rendered in the site's local time.
pub fn parse_site_date(raw: &str, layout: &str) -> Result<DateTime<Utc>, ParseError> {
    let text = trim_html_text(raw);
    let naive = NaiveDateTime::parse_from_str(text, layout)
        .map_err(|_| ParseError::InvalidDate(text.to_string()))?;
    site::TIMEZONE
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ParseError::InvalidDate(text.to_string()))
}

/// Prefers the `data-time` epoch attribute and falls back to the rendered text.
pub fn popup_date(el: ElementRef<'_>, layouts: &[&str]) -> Result<DateTime<Utc>, ParseError> {
    if let Some(attr) = el.value().attr("data-time")
        && let Ok(date) = parse_epoch(attr)
    {
        return Ok(date);
    }
    let text: String = el.text().collect();
    layouts
        .iter()
        .find_map(|layout| parse_site_date(&text, layout).ok())
        .ok_or_else(|| ParseError::InvalidDate(trim_html_text(&text).to_string()))
}

/// Whitespace separated tag list as a lower-cased set.
pub fn tag_set(raw: &str) -> std::collections::BTreeSet<String> {
    raw.split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use std::sync::LazyLock;

    static SKIP: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".skip").unwrap());
    static ROOT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#root").unwrap());

    #[test]
    fn test_element_text_skips_and_repairs_links() {
        let doc = Html::parse_fragment(
            r#"<div id="root"> Hello <span class="skip">warning</span><a class="auto_link" href="https://example.com/a/very/long/path">example.com/a/.....</a> bye </div>"#,
        );
        let root = doc.select(&ROOT).next().unwrap();
        let text = element_text(root, &[&*SKIP]);
        assert_eq!(
            trim_html_text(&text),
            "Hello https://example.com/a/very/long/path bye"
        );
    }

    #[test]
    fn test_inner_html_without() {
        let doc = Html::parse_fragment(
            r#"<div id="root"><div class="skip">head</div><p>a &amp; b</p></div>"#,
        );
        let root = doc.select(&ROOT).next().unwrap();
        assert_eq!(inner_html_without(root, &[&*SKIP]), "<p>a &amp; b</p>");
    }

    #[test]
    fn test_parse_site_date_uses_pacific_time() {
        // PDT is UTC-7
        let date = parse_site_date(" Jul 4, 2025 09:15PM\n", NOTE_DATE_LAYOUT).unwrap();
        assert_eq!(date.to_rfc3339(), "2025-07-05T04:15:00+00:00");

        let date = parse_site_date("January 2, 2025 03:04:05 PM", MESSAGE_DATE_LAYOUT).unwrap();
        assert_eq!(date.to_rfc3339(), "2025-01-02T23:04:05+00:00");
    }

    #[test]
    fn test_parse_epoch() {
        assert_eq!(parse_epoch("1700000000").unwrap().timestamp(), 1_700_000_000);
        assert!(matches!(parse_epoch("soon"), Err(ParseError::InvalidDate(_))));
    }

    #[test]
    fn test_tag_set() {
        let tags = tag_set(" Fox  anthro\tfox ");
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["anthro", "fox"]);
    }
}
