//! Browser-driven capture for Notion pages.

use resourcesync_browser::{BrowserHandle, CdpError, MIN_HTML_BYTES};
use tracing::debug;

use crate::{FetchError, MIN_CONTENT_CHARS};

/// Render a Notion page in the remote browser and normalize it to Markdown.
pub(crate) async fn fetch(browser: &mut BrowserHandle, url: &str) -> Result<String, FetchError> {
    let page = browser.fetch_page(url).await.map_err(map_cdp_error)?;

    if page.html.len() < MIN_HTML_BYTES {
        return Err(FetchError::NavigationFailed {
            bytes: page.html.len(),
        });
    }

    let text = resourcesync_markdown::normalize(&page.html, &page.code_block_texts);

    if text.chars().count() < MIN_CONTENT_CHARS {
        return Err(FetchError::EmptyContent {
            chars: text.chars().count(),
        });
    }

    debug!(%url, chars = text.len(), "notion page captured");
    Ok(text)
}

fn map_cdp_error(err: CdpError) -> FetchError {
    match err {
        CdpError::Unavailable(detail) => FetchError::BrowserUnavailable(detail),
        CdpError::Connection(detail) => FetchError::Transport(detail),
        CdpError::Protocol { method, detail } => {
            FetchError::Protocol(format!("{method}: {detail}"))
        }
    }
}
