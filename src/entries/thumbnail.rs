use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;
use url::Url;

pub const THUMBNAIL_SIZE_LARGE: u32 = 600;
pub const THUMBNAIL_SIZE_SMALL: u32 = 300;

// Thumbnail paths look like `/<id>@<size>-<timestamp>.jpg`.
static SIZE_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*@)(\d*)(-.*)").unwrap());

/// Thumbnail address whose size is encoded in the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailUrl(Url);

impl ThumbnailUrl {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// Size token of the path, 0 when it has none.
    pub fn size(&self) -> u32 {
        SIZE_TOKEN_REGEX
            .captures(self.0.path())
            .and_then(|c| c.get(2))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }

    /// Same image at another size. Paths without a size token are returned as is.
    pub fn with_size(&self, size: u32) -> ThumbnailUrl {
        let path = SIZE_TOKEN_REGEX.replace(self.0.path(), |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], size, &caps[3])
        });
        let mut url = self.0.clone();
        url.set_path(&path);
        ThumbnailUrl(url)
    }

    pub fn large(&self) -> ThumbnailUrl {
        self.with_size(THUMBNAIL_SIZE_LARGE)
    }

    pub fn small(&self) -> ThumbnailUrl {
        self.with_size(THUMBNAIL_SIZE_SMALL)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl Display for ThumbnailUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
