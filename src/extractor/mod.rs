//! Parsers that turn site pages into entries.
//!
//! Parsing is synchronous and works on the decoded page body; the parsed DOM
//! never outlives a single call.

pub mod content;
pub mod errors;
pub mod login;
pub mod messages;
pub mod notes;
pub mod submissions;
pub mod text;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};

use crate::entries::EntryType;

pub use content::{
    parse_comment_content, parse_journal_content, parse_note_content, parse_submission_content,
};
pub use errors::ParseError;
pub use login::is_logged_in_page;
pub use messages::parse_others;
pub use notes::parse_notes;
pub use submissions::{SubmissionListing, parse_submissions};

/// Decides whether an entry dated `date` is recent enough to be reported.
pub trait DateGate {
    fn accepts(&self, entry_type: EntryType, date: DateTime<Utc>) -> bool;
}

/// Gate that lets every date through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl DateGate for AcceptAll {
    fn accepts(&self, _entry_type: EntryType, _date: DateTime<Utc>) -> bool {
        true
    }
}

impl<F> DateGate for F
where
    F: Fn(EntryType, DateTime<Utc>) -> bool,
{
    fn accepts(&self, entry_type: EntryType, date: DateTime<Utc>) -> bool {
        self(entry_type, date)
    }
}
