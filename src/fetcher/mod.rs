pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

use async_trait::async_trait;
use url::Url;

pub use client::{HttpFetcher, fetch, post_form};
pub use errors::FetchError;
pub use types::{Charset, Cookies, PageResponse};

/// Retrieves pages of the site on behalf of a user.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, cookies: &Cookies) -> Result<PageResponse, FetchError>;

    async fn post_form(
        &self,
        url: &Url,
        cookies: &Cookies,
        form: &[(String, String)],
    ) -> Result<(), FetchError>;
}
