//! Username whitelists and blocked-tag matching.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::entries::{EntryType, normalize_username};

/// Per entry type username whitelist. A type without a whitelist lets every
/// author through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    filters: HashMap<EntryType, HashSet<String>>,
}

impl UserFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whitelist of `entry_type`. An empty list removes it.
    pub fn set_filter<I, S>(&mut self, entry_type: EntryType, users: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let users: HashSet<String> = users
            .into_iter()
            .map(|u| normalize_username(u.as_ref()))
            .filter(|u| !u.is_empty())
            .collect();
        if users.is_empty() {
            self.filters.remove(&entry_type);
        } else {
            self.filters.insert(entry_type, users);
        }
    }

    pub fn with_filter<I, S>(mut self, entry_type: EntryType, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_filter(entry_type, users);
        self
    }

    pub fn filter(&self, entry_type: EntryType) -> Option<&HashSet<String>> {
        self.filters.get(&entry_type)
    }

    pub fn is_whitelisted(&self, entry_type: EntryType, user: &str) -> bool {
        match self.filters.get(&entry_type) {
            Some(allowed) => allowed.contains(&normalize_username(user)),
            None => true,
        }
    }
}

/// Splits a configured user list on commas and whitespace.
pub fn parse_user_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tags of a submission that appear on the blocklist.
pub fn blocked_reasons(tags: &BTreeSet<String>, blocked: &BTreeSet<String>) -> BTreeSet<String> {
    tags.intersection(blocked).cloned().collect()
}
