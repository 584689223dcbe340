use thiserror::Error;

/// Reasons a single listing node or content page could not be turned into data.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing element {0}")]
    MissingElement(&'static str),

    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),

    #[error("invalid id {0:?}")]
    InvalidId(String),

    #[error("invalid date {0:?}")]
    InvalidDate(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid username in {0}")]
    InvalidUsername(String),

    #[error("empty content")]
    EmptyContent,
}
