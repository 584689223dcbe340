use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Kind of notification-worthy item on the site.
///
/// `Invalid` exists so that a zero or unknown stored code has a name; it is
/// never collected, filtered on, or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryType {
    Invalid,
    Note,
    Submission,
    SubmissionComment,
    Journal,
    JournalComment,
}

const VALID_ENTRY_TYPES: [EntryType; 5] = [
    EntryType::Note,
    EntryType::Submission,
    EntryType::SubmissionComment,
    EntryType::Journal,
    EntryType::JournalComment,
];

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown entry type code {0}")]
pub struct UnknownEntryType(pub i16);

impl EntryType {
    /// All collectable types, in a fixed order.
    pub fn valid_entry_types() -> &'static [EntryType] {
        &VALID_ENTRY_TYPES
    }

    pub fn is_valid(self) -> bool {
        self != EntryType::Invalid
    }

    pub fn name(self) -> &'static str {
        match self {
            EntryType::Invalid => "INVALID",
            EntryType::Note => "Note",
            EntryType::Submission => "Submission",
            EntryType::SubmissionComment => "Submission Comment",
            EntryType::Journal => "Journal",
            EntryType::JournalComment => "Journal Comment",
        }
    }

    /// Configuration key holding the username whitelist for this type.
    /// Both comment types read the same key.
    pub fn filter_env_var(self) -> Option<&'static str> {
        match self {
            EntryType::Invalid => None,
            EntryType::Note => Some("FILTER_NOTES"),
            EntryType::Submission => Some("FILTER_SUBMISSIONS"),
            EntryType::Journal => Some("FILTER_JOURNALS"),
            EntryType::SubmissionComment | EntryType::JournalComment => Some("FILTER_COMMENTS"),
        }
    }

    /// Stable code used in the database.
    pub fn code(self) -> i16 {
        match self {
            EntryType::Invalid => 0,
            EntryType::Note => 1,
            EntryType::Submission => 2,
            EntryType::SubmissionComment => 3,
            EntryType::Journal => 4,
            EntryType::JournalComment => 5,
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            EntryType::SubmissionComment | EntryType::JournalComment
        )
    }
}

impl TryFrom<i16> for EntryType {
    type Error = UnknownEntryType;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EntryType::Invalid),
            1 => Ok(EntryType::Note),
            2 => Ok(EntryType::Submission),
            3 => Ok(EntryType::SubmissionComment),
            4 => Ok(EntryType::Journal),
            5 => Ok(EntryType::JournalComment),
            other => Err(UnknownEntryType(other)),
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
