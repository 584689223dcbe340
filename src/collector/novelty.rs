use tracing::warn;

use crate::entries::EntryType;
use crate::repositories::KnownEntryStore;

/// Whether the user has not been notified about this entry yet.
///
/// A failing store counts as "not new" so an outage never floods the user
/// with entries they already saw.
pub async fn is_new(
    store: &dyn KnownEntryStore,
    entry_type: EntryType,
    entry_id: u64,
    user_id: i64,
) -> bool {
    match store.exists(entry_type, entry_id, user_id).await {
        Ok(exists) => !exists,
        Err(e) => {
            warn!(
                "Known entry lookup failed for {} {} (user {}): {}",
                entry_type, entry_id, user_id, e
            );
            false
        }
    }
}
