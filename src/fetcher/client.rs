use crate::fetcher::{
    DocumentFetcher,
    errors::FetchError,
    pipeline::process_response,
    types::{Cookies, PageResponse},
};
use crate::site;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, RequestBuilder, header};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(site::REQUEST_TIMEOUT)
        .user_agent(site::USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers({
            let mut headers = header::HeaderMap::new();
            headers.insert(
                header::ACCEPT,
                header::HeaderValue::from_static(
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                ),
            );
            headers
        })
        .build()
        .expect("Failed to build HTTP client")
});

fn with_cookies(request: RequestBuilder, cookies: &Cookies) -> RequestBuilder {
    if cookies.is_empty() {
        request
    } else {
        request.header(header::COOKIE, cookies.header_value())
    }
}

#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &Url, cookies: &Cookies) -> Result<PageResponse, FetchError> {
    let response = with_cookies(HTTP_CLIENT.get(url.clone()), cookies)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let final_url = response.url().clone();
    let status = response.status();
    let headers = response.headers().clone();

    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Io(e.to_string()))?;

    // Content-Length may be missing or wrong for compressed bodies
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    debug!(status = %status, bytes = body_bytes.len(), "fetched page");
    process_response(final_url, status, headers, body_bytes, &content_type)
}

#[instrument(skip_all, fields(url = %url, fields = form.len()))]
pub async fn post_form(
    url: &Url,
    cookies: &Cookies,
    form: &[(String, String)],
) -> Result<(), FetchError> {
    let response = with_cookies(HTTP_CLIENT.post(url.clone()), cookies)
        .form(form)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }
    Ok(())
}

/// Fetcher backed by the shared reqwest client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, cookies: &Cookies) -> Result<PageResponse, FetchError> {
        fetch(url, cookies).await
    }

    async fn post_form(
        &self,
        url: &Url,
        cookies: &Cookies,
        form: &[(String, String)],
    ) -> Result<(), FetchError> {
        post_form(url, cookies, form).await
    }
}
