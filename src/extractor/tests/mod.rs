use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use url::Url;

use crate::entries::{Entry, EntryType, Rating, SubmissionType};
use crate::extractor::{
    AcceptAll, ParseError, is_logged_in_page, parse_comment_content, parse_journal_content,
    parse_note_content, parse_notes, parse_others, parse_submission_content, parse_submissions,
};


fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn not_before(floor: DateTime<Utc>) -> impl Fn(EntryType, DateTime<Utc>) -> bool {
    move |_, date| date >= floor
}

#[test]
fn test_notes_listing() {
    let notes = parse_notes(&fixture("notes.html"), &AcceptAll);

    // the note without a send date is skipped
    let ids: Vec<u64> = notes.iter().map(|n| n.id()).collect();
    assert_eq!(ids, vec![100, 101]);
    assert!(notes.iter().all(|n| n.was_unread()));

    let first = Entry::Note(notes[0].clone());
    assert_eq!(first.title(), "Commission question");
    assert_eq!(first.date().timestamp(), 1_741_120_500);
    assert_eq!(first.from().user_name, "quickfox");
    assert_eq!(first.from().name(), "Quick Fox");
    assert_eq!(first.link().path(), "/msg/pms/1/100/");

    let second = Entry::Note(notes[1].clone());
    assert_eq!(second.title(), "Trade?");
    assert_eq!(second.date().to_rfc3339(), "2025-07-05T04:15:00+00:00");
    assert_eq!(second.from().user_name, "lazydog");
    assert_eq!(
        second.from().profile_url.as_ref().map(Url::path),
        Some("/user/lazydog/")
    );
}

#[test]
fn test_notes_listing_date_gate() {
    let floor = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let notes = parse_notes(&fixture("notes.html"), &not_before(floor));
    assert_eq!(notes.iter().map(|n| n.id()).collect::<Vec<_>>(), vec![101]);
}

#[test]
fn test_note_content() {
    let content = parse_note_content(&fixture("note_view.html"), 100).unwrap();
    assert_eq!(content.id, 100);
    assert!(content.text.starts_with("Hi! Are your commissions still open?"));
    assert!(content.text.contains("https://www.furaffinity.net/commissions/quickfox/"));
    assert!(!content.text.contains("earlier message"));
    assert!(!content.text.contains("Be careful"));
    assert!(!content.text.contains("Reply"));
}

#[test]
fn test_note_content_missing_body() {
    let result = parse_note_content("<html><body></body></html>", 1);
    assert_eq!(
        result.unwrap_err(),
        ParseError::MissingElement("#message .section-body")
    );
}

#[test]
fn test_submissions_listing() {
    let listing = parse_submissions(&fixture("submissions.html"), &AcceptAll);

    assert_eq!(
        listing.blocked_tags.iter().cloned().collect::<Vec<_>>(),
        vec!["anthro", "gore"]
    );

    let ids: Vec<u64> = listing.entries.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![5, 4, 3]);

    let fox = &listing.entries[0];
    assert_eq!(fox.kind(), SubmissionType::Image);
    assert_eq!(fox.rating(), Rating::General);
    assert_eq!(fox.listing_date().timestamp(), 1_741_219_200);
    assert!(fox.tags().contains("anthro"));
    assert!(fox.tags().contains("fox"));
    assert_eq!(fox.description(), "A fox & the sunset");
    let thumb = fox.thumbnail().unwrap();
    assert_eq!(thumb.as_url().scheme(), "https");
    assert_eq!(thumb.size(), 200);
    assert_eq!(fox.link().path(), "/view/5/");

    let story = &listing.entries[1];
    assert_eq!(story.kind(), SubmissionType::Text);
    assert_eq!(story.rating(), Rating::Mature);
    assert_eq!(Entry::Submission(story.clone()).title(), "Chapter 3: The \"Return\"");
    assert_eq!(Entry::Submission(story.clone()).from().user_name, "lazydog");

    assert_eq!(listing.entries[2].rating(), Rating::Adult);
}

#[test]
fn test_submissions_section_gate() {
    let floor = Utc.with_ymd_and_hms(2025, 3, 6, 0, 0, 0).unwrap();
    let listing = parse_submissions(&fixture("submissions.html"), &not_before(floor));
    let ids: Vec<u64> = listing.entries.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![5, 4]);
}

#[test]
fn test_submission_content() {
    let listing = parse_submissions(&fixture("submissions.html"), &AcceptAll);
    let fox = &listing.entries[0];

    let content = parse_submission_content(&fixture("submission_view.html"), fox).unwrap();
    assert_eq!(content.id, 5);
    assert_eq!(content.date.timestamp(), 1_741_219_100);
    assert_eq!(
        content.full_view.as_ref().map(Url::as_str),
        Some("https://d.furaffinity.net/art/quickfox/1741219100/1741219100.quickfox_sunset.png")
    );
    assert!(content.description_text.contains("sunset"));
    assert!(content.description_text.contains("https://example.com/quickfox/gallery"));
    assert!(!content.description_text.contains("Header blurb"));
    assert!(!content.description_text.contains("Footer blurb"));
    assert!(!content.description_text.contains("alert"));
    assert!(content.description_html.contains("<b>sunset</b>"));
    assert!(!content.description_html.contains("script"));
    assert!(!content.description_html.contains("Footer blurb"));
    assert_eq!(content.thumbnail.as_ref(), fox.thumbnail());
}

#[test]
fn test_image_submission_requires_full_view() {
    let listing = parse_submissions(&fixture("submissions.html"), &AcceptAll);
    let html = fixture("submission_view.html").replace("data-fullview-src", "data-other-src");

    let image = &listing.entries[0];
    assert_eq!(
        parse_submission_content(&html, image).unwrap_err(),
        ParseError::MissingAttribute("data-fullview-src")
    );

    let story = &listing.entries[1];
    let content = parse_submission_content(&html, story).unwrap();
    assert!(content.full_view.is_none());
}

#[test]
fn test_others_listing() {
    let entries = parse_others(
        &fixture("others.html"),
        EntryType::valid_entry_types(),
        &AcceptAll,
    );

    let summary: Vec<(EntryType, u64)> = entries.iter().map(|e| (e.entry_type(), e.id())).collect();
    assert_eq!(
        summary,
        vec![
            (EntryType::SubmissionComment, 9001),
            (EntryType::SubmissionComment, 9002),
            (EntryType::Journal, 4321),
            (EntryType::Journal, 1),
            (EntryType::JournalComment, 777),
        ]
    );

    let comment = &entries[0];
    assert_eq!(comment.title(), "Sunset fox");
    assert_eq!(comment.from().user_name, "quickfox");
    assert_eq!(comment.link().fragment(), Some("cid:9001"));

    // text date in Pacific time (PST, UTC-8)
    assert_eq!(entries[1].date().to_rfc3339(), "2025-03-05T05:15:30+00:00");

    let journal = &entries[2];
    assert_eq!(journal.title(), "Stream tonight");
    assert_eq!(journal.from().user_name, "scaly");
    assert_eq!(journal.from().name(), "Scaly");
}

#[test]
fn test_others_listing_only_requested_types() {
    let floor = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let entries = parse_others(
        &fixture("others.html"),
        &[EntryType::Journal],
        &not_before(floor),
    );
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id(), 4321);
}

#[test]
fn test_comment_content() {
    let html = fixture("comment_view.html");

    let content = parse_comment_content(&html, 9001, "cid:9001").unwrap();
    assert_eq!(
        content.text,
        "Love the colors, reference at https://example.com/palettes/sunset"
    );

    assert_eq!(
        parse_comment_content(&html, 9003, "cid:9003").unwrap_err(),
        ParseError::EmptyContent
    );
    assert!(parse_comment_content(&html, 9999, "cid:9999").is_err());
}

#[test]
fn test_journal_content() {
    let content = parse_journal_content(&fixture("journal_view.html"), 4321).unwrap();
    assert!(content.text.starts_with("Streaming at 8pm PT!"));
    assert!(content.text.ends_with("https://example.com/live/scaly"));

    assert_eq!(
        parse_journal_content("<html><body><div id=\"site-content\"><div class=\"journal-content\"> </div></div></body></html>", 1)
            .unwrap_err(),
        ParseError::EmptyContent
    );
}

#[test]
fn test_login_page_detection() {
    assert!(!is_logged_in_page(&fixture("settings_logged_out.html")));
    assert!(is_logged_in_page(&fixture("notes.html")));
}
