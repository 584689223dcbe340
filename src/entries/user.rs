use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Placeholder username used when the author could not be recovered.
pub const UNKNOWN_USERNAME: &str = "UNKNOWN";

// Usernames may contain letters, digits, dashes, dots and tildes.
static PROFILE_USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*/user/([\w\-.~]*)/*").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurAffinityUser {
    pub display_name: String,
    pub user_name: String,
    pub profile_url: Option<Url>,
}

impl FurAffinityUser {
    pub fn unknown() -> Self {
        Self {
            display_name: String::new(),
            user_name: UNKNOWN_USERNAME.to_string(),
            profile_url: None,
        }
    }

    /// Display name when present, the username otherwise.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.user_name
        } else {
            &self.display_name
        }
    }

    pub fn is_valid(&self) -> bool {
        self.name() != UNKNOWN_USERNAME
    }
}

impl Default for FurAffinityUser {
    fn default() -> Self {
        Self::unknown()
    }
}

pub fn normalize_username(user: &str) -> String {
    user.trim().to_lowercase()
}

/// Extracts the (normalized) username from a `/user/<name>/` link.
pub fn username_from_profile_link(link: &Url) -> Option<String> {
    let captures = PROFILE_USERNAME_REGEX.captures(link.path())?;
    let name = captures.get(1)?.as_str();
    if name.is_empty() {
        return None;
    }
    Some(normalize_username(name))
}
