pub mod known_entry;
pub mod user;

pub use known_entry::{KnownEntryStore, MemoryKnownEntryStore, PgKnownEntryStore, StoreError};
pub use user::{UserDirectory, UserRepository};
