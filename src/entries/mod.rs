pub mod entry_type;
pub mod model;
pub mod thumbnail;
pub mod user;

pub use entry_type::{EntryType, UnknownEntryType};
pub use model::{
    CommentEntry, Entry, EntryContent, JournalEntry, NoteEntry, Rating, SubmissionContent,
    SubmissionData, SubmissionEntry, SubmissionType, TextContent,
};
pub use thumbnail::ThumbnailUrl;
pub use user::{FurAffinityUser, normalize_username, username_from_profile_link};
