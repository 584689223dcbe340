//! Addresses and fixed parameters of the origin site.

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "https://www.furaffinity.net";
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:143.0) Gecko/20100101 Firefox/143.0";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timestamps rendered as text on the site are in this zone.
pub const TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

pub const NOTES_PATH: &str = "/msg/pms/";
pub const SUBMISSIONS_PATH: &str = "/msg/submissions/new@72/";
pub const OTHERS_PATH: &str = "/msg/others/";
pub const SETTINGS_PATH: &str = "/controls/settings";

/// Number of submissions the submissions inbox shows per page.
pub const LISTING_PAGE_CAPACITY: usize = 72;

static BASE: Lazy<Url> = Lazy::new(|| Url::parse(BASE_URL).expect("static base url"));

/// Resolves an href found in a page against the site root.
pub fn resolve(href: &str) -> Result<Url, url::ParseError> {
    BASE.join(href)
}

pub fn note_link(id: u64) -> Url {
    BASE.join(&format!("{NOTES_PATH}1/{id}/#message"))
        .expect("static note path")
}

pub fn submission_link(id: u64) -> Url {
    BASE.join(&format!("/view/{id}/"))
        .expect("static view path")
}

pub fn path(path: &str) -> Url {
    BASE.join(path).expect("static site path")
}
