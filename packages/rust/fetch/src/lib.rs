//! Per-source fetch strategies and the per-item failure taxonomy.
//!
//! Every fetch resolves to either normalized text or a typed
//! [`FetchError`]; nothing here panics or aborts a run. The orchestrator
//! catches each error at this boundary and keeps going.

mod export;
mod notion;

use std::time::Duration;

use resourcesync_browser::BrowserHandle;
use resourcesync_shared::{BrowserConfig, SourceType, is_notion_host};

pub use export::derive_export_url;

/// Browser-like User-Agent for direct export retrieval; the export
/// endpoints reject obviously non-browser agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Normalized text below this length signals a page that never rendered
/// real content.
pub const MIN_CONTENT_CHARS: usize = 200;

const EXPORT_BASE: &str = "https://docs.google.com";

// ---------------------------------------------------------------------------
// Failure taxonomy
// ---------------------------------------------------------------------------

/// Typed per-item fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The browser debug endpoint is unreachable. Not retryable this run;
    /// retryable next run.
    #[error("browser not available: {0}")]
    BrowserUnavailable(String),

    /// The page loaded but returned implausibly short HTML.
    #[error("page did not load ({bytes} bytes of HTML)")]
    NavigationFailed { bytes: usize },

    /// Normalization produced too little text to be real content.
    #[error("no meaningful content found ({chars} chars)")]
    EmptyContent { chars: usize },

    /// The export endpoint requires a login.
    #[error("access denied (requires login)")]
    AccessDenied,

    /// Non-2xx export response other than 403.
    #[error("HTTP {0}")]
    HttpError(u16),

    /// Network-level failure (DNS, connect, read).
    #[error("fetch error: {0}")]
    Transport(String),

    /// Malformed response on the browser control channel.
    #[error("browser protocol error: {0}")]
    Protocol(String),

    /// No strategy exists for this source type. Terminal: retrying will
    /// never succeed, unlike the transient variants above.
    #[error("unsupported domain: {0}")]
    UnsupportedDomain(String),
}

impl FetchError {
    /// Terminal classifications are reported separately from transient
    /// failures: they stay uncovered forever rather than until next run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchError::UnsupportedDomain(_))
    }
}

// ---------------------------------------------------------------------------
// Fetcher trait + strategy dispatch
// ---------------------------------------------------------------------------

/// Source of captured text, one call per uncovered item.
///
/// The orchestrator is generic over this so tests can substitute a stub.
pub trait ResourceFetcher {
    /// Reachability probe for the browser mechanism, checked once per run.
    async fn browser_available(&self) -> bool;

    /// Fetch one resource through the strategy for its source type.
    async fn fetch(&mut self, source: SourceType, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher: browser-driven capture for Notion, export-endpoint
/// retrieval for Google Docs/Sheets.
pub struct StrategyFetcher {
    browser: BrowserHandle,
    http: reqwest::Client,
    export_base: String,
}

impl StrategyFetcher {
    pub fn new(browser_config: BrowserConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport(format!("build HTTP client: {e}")))?;

        Ok(Self {
            browser: BrowserHandle::new(browser_config),
            http,
            export_base: EXPORT_BASE.to_string(),
        })
    }

    /// Point export retrieval at a mock server.
    #[cfg(test)]
    fn with_export_base(mut self, base: impl Into<String>) -> Self {
        self.export_base = base.into();
        self
    }
}

impl ResourceFetcher for StrategyFetcher {
    async fn browser_available(&self) -> bool {
        self.browser.probe().await
    }

    async fn fetch(&mut self, source: SourceType, url: &str) -> Result<String, FetchError> {
        match source {
            SourceType::Notion => notion::fetch(&mut self.browser, url).await,
            SourceType::Gdoc | SourceType::Gsheet => {
                export::fetch(&self.http, &self.export_base, url).await
            }
            // Id-less Notion URLs classify as Other but still render in the
            // browser; dispatch falls back to the host.
            SourceType::Other if is_notion_host(url) => {
                notion::fetch(&mut self.browser, url).await
            }
            SourceType::Gdrive | SourceType::Other => Err(FetchError::UnsupportedDomain(
                resourcesync_shared::url_domain(url),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resourcesync_shared::normalize_url;

    #[tokio::test]
    async fn unsupported_sources_rejected_immediately() {
        let mut fetcher = StrategyFetcher::new(BrowserConfig::default()).unwrap();

        let url = "https://drive.google.com/drive/folders/1AbC";
        let key = normalize_url(url);
        let err = fetcher.fetch(key.source, url).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedDomain(_)));
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn idless_notion_url_dispatches_to_browser() {
        // No 32-hex page id, so classification falls back to Other; the
        // host still routes it to the browser strategy. With no browser
        // reachable that surfaces as BrowserUnavailable, never as the
        // terminal UnsupportedDomain.
        let config = BrowserConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ..BrowserConfig::default()
        };
        let mut fetcher = StrategyFetcher::new(config).unwrap();

        let url = "https://notion.so/pricing";
        let key = normalize_url(url);
        assert_eq!(key.source, SourceType::Other);

        let err = fetcher.fetch(key.source, url).await.unwrap_err();
        assert!(matches!(err, FetchError::BrowserUnavailable(_)));
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn gdoc_dispatches_to_export_strategy() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document/d/abc123/export"))
            .respond_with(ResponseTemplate::new(200).set_body_string("doc body"))
            .mount(&server)
            .await;

        let mut fetcher = StrategyFetcher::new(BrowserConfig::default())
            .unwrap()
            .with_export_base(server.uri());

        let url = "https://docs.google.com/document/d/abc123/edit";
        let key = normalize_url(url);
        let body = fetcher.fetch(key.source, url).await.unwrap();
        assert_eq!(body, "doc body");
    }

    #[test]
    fn transient_errors_are_not_terminal() {
        assert!(!FetchError::BrowserUnavailable("x".into()).is_terminal());
        assert!(!FetchError::HttpError(500).is_terminal());
        assert!(!FetchError::AccessDenied.is_terminal());
        assert!(!FetchError::EmptyContent { chars: 3 }.is_terminal());
    }
}
