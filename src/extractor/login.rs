use scraper::{Html, Selector};
use std::sync::LazyLock;

static NOTICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#site-content .notice-message").unwrap());

/// Whether a settings page was served to a logged-in session.
pub fn is_logged_in_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    let Some(notice) = document.select(&NOTICE).next() else {
        return true;
    };
    let text = notice.text().collect::<String>().to_lowercase();
    !(text.contains("system message") && text.contains("please log in"))
}
