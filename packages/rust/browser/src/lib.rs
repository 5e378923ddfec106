//! Remote browser client over the Chrome DevTools Protocol.
//!
//! Notion pages populate their content via script after the initial load, so
//! a plain HTTP GET returns an empty shell. This crate drives a real browser
//! session instead: it discovers the debug endpoint, opens one persistent
//! websocket channel, and for each fetch creates a disposable page, navigates
//! it, waits out rendering, and extracts the live DOM.
//!
//! The channel is an expensive shared resource: [`BrowserHandle`] connects
//! lazily on first use, reuses the same channel for every fetch in a run,
//! and drops the cached client after a connection-level error so the next
//! call reconnects from scratch.

mod protocol;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, warn};

use resourcesync_shared::BrowserConfig;

pub use protocol::LoadOutcome;
use protocol::{build_command, match_event, match_response};

/// Minimum plausible HTML size; anything shorter is a blank or error page.
pub const MIN_HTML_BYTES: usize = 500;

/// Timeout for the debug-endpoint discovery call.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Script evaluated in the page to pull code-block text out of the live DOM.
///
/// Notion fragments code across many nested inline spans, so the static
/// HTML cannot be reliably reassembled; `innerText` on the rendered element
/// is the only faithful source.
const CODE_BLOCK_SCRIPT: &str = r#"
    (() => {
        const blocks = document.querySelectorAll('[class*="notion-code-block"]');
        const results = [];
        blocks.forEach(b => {
            results.push(b.innerText || '');
        });
        return JSON.stringify(results);
    })()
"#;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Browser client failure modes.
#[derive(Debug, thiserror::Error)]
pub enum CdpError {
    /// The debug endpoint did not answer; no browser session can be opened.
    #[error("debug endpoint unreachable: {0}")]
    Unavailable(String),

    /// The websocket channel failed at the transport level. The cached
    /// client is invalidated so the next fetch reconnects.
    #[error("browser channel error: {0}")]
    Connection(String),

    /// A command response carried an error field or was malformed.
    #[error("protocol error in {method}: {detail}")]
    Protocol { method: String, detail: String },
}

impl CdpError {
    fn protocol(method: &str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            method: method.to_string(),
            detail: detail.into(),
        }
    }
}

/// A rendered page: the serialized DOM plus out-of-band code-block texts
/// in document order.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub code_block_texts: Vec<String>,
}

// ---------------------------------------------------------------------------
// CdpClient — one live websocket channel
// ---------------------------------------------------------------------------

/// A connected DevTools channel with monotonically increasing request ids.
pub struct CdpClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    load_timeout: Duration,
    settle_delay: Duration,
}

impl CdpClient {
    /// Discover the debug endpoint and open the websocket channel.
    pub async fn connect(config: &BrowserConfig) -> Result<Self, CdpError> {
        let ws_url = discover_ws_url(&config.host, config.port).await?;

        let (ws, _response) = connect_async(&ws_url)
            .await
            .map_err(|e| CdpError::Connection(format!("connect to {ws_url}: {e}")))?;

        debug!(%ws_url, "browser channel opened");

        Ok(Self {
            ws,
            next_id: 0,
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            settle_delay: Duration::from_secs(config.settle_secs),
        })
    }

    /// Send one command and wait for its correlated response.
    ///
    /// Unsolicited events arriving in between are discarded; only the
    /// response whose id matches this request resolves the call.
    async fn send(
        &mut self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        self.next_id += 1;
        let id = self.next_id;
        let msg = build_command(id, method, params, session_id);

        self.ws
            .send(Message::Text(msg.to_string()))
            .await
            .map_err(|e| CdpError::Connection(format!("send {method}: {e}")))?;

        loop {
            let frame = self
                .ws
                .next()
                .await
                .ok_or_else(|| CdpError::Connection("channel closed".into()))?
                .map_err(|e| CdpError::Connection(format!("recv: {e}")))?;

            let Message::Text(text) = frame else {
                continue;
            };
            let Ok(obj) = serde_json::from_str::<Value>(&text) else {
                continue;
            };

            match match_response(&obj, id) {
                Some(Ok(result)) => return Ok(result),
                Some(Err(detail)) => return Err(CdpError::protocol(method, detail)),
                None => continue,
            }
        }
    }

    /// Wait for a session-scoped event, bounded by `timeout`.
    ///
    /// Never fails past the bound: a missing event is an explicit
    /// [`LoadOutcome::TimedOut`], and the caller proceeds identically on
    /// either outcome.
    async fn wait_for_event(
        &mut self,
        event: &str,
        session_id: Option<&str>,
        timeout: Duration,
    ) -> LoadOutcome {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return LoadOutcome::TimedOut;
            }

            let frame = match tokio::time::timeout(remaining, self.ws.next()).await {
                Ok(Some(Ok(frame))) => frame,
                Ok(Some(Err(_))) | Ok(None) | Err(_) => return LoadOutcome::TimedOut,
            };

            let Message::Text(text) = frame else {
                continue;
            };
            let Ok(obj) = serde_json::from_str::<Value>(&text) else {
                continue;
            };

            if match_event(&obj, event, session_id) {
                return LoadOutcome::Signaled;
            }
        }
    }

    /// Render `url` in a disposable page and return the serialized DOM plus
    /// code-block texts.
    ///
    /// The page-load wait is best effort: on timeout the fetch proceeds with
    /// whatever has rendered. Teardown failures are swallowed.
    pub async fn fetch_page(&mut self, url: &str) -> Result<RenderedPage, CdpError> {
        let created = self
            .send("Target.createTarget", json!({"url": "about:blank"}), None)
            .await?;
        let target_id = created["targetId"]
            .as_str()
            .ok_or_else(|| CdpError::protocol("Target.createTarget", "no targetId in result"))?
            .to_string();

        let attached = self
            .send(
                "Target.attachToTarget",
                json!({"targetId": target_id, "flatten": true}),
                None,
            )
            .await?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::protocol("Target.attachToTarget", "no sessionId in result"))?
            .to_string();

        self.send("Page.enable", json!({}), Some(&session_id))
            .await?;
        self.send("Page.navigate", json!({"url": url}), Some(&session_id))
            .await?;

        let outcome = self
            .wait_for_event("Page.loadEventFired", Some(&session_id), self.load_timeout)
            .await;
        if outcome == LoadOutcome::TimedOut {
            debug!(%url, "load event never fired, proceeding with current DOM");
        }

        // Deferred script rendering settles after the load event.
        tokio::time::sleep(self.settle_delay).await;

        let evaluated = self
            .send(
                "Runtime.evaluate",
                json!({
                    "expression": "document.documentElement.outerHTML",
                    "returnByValue": true,
                }),
                Some(&session_id),
            )
            .await?;
        let html = evaluated["result"]["value"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let code_block_texts = match self
            .send(
                "Runtime.evaluate",
                json!({"expression": CODE_BLOCK_SCRIPT, "returnByValue": true}),
                Some(&session_id),
            )
            .await
        {
            Ok(result) => result["result"]["value"]
                .as_str()
                .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
                .unwrap_or_default(),
            Err(e) => {
                warn!(%url, error = %e, "code block extraction failed");
                Vec::new()
            }
        };

        // Best-effort teardown; a leaked page must never fail the fetch.
        if let Err(e) = self
            .send("Target.closeTarget", json!({"targetId": target_id}), None)
            .await
        {
            warn!(%url, error = %e, "failed to close browser target");
        }

        Ok(RenderedPage {
            html,
            code_block_texts,
        })
    }
}

/// Fetch the websocket connect address from the well-known metadata path.
async fn discover_ws_url(host: &str, port: u16) -> Result<String, CdpError> {
    let endpoint = format!("http://{host}:{port}/json/version");

    let client = reqwest::Client::builder()
        .timeout(DISCOVERY_TIMEOUT)
        .build()
        .map_err(|e| CdpError::Unavailable(e.to_string()))?;

    let meta: Value = client
        .get(&endpoint)
        .send()
        .await
        .map_err(|e| CdpError::Unavailable(format!("{endpoint}: {e}")))?
        .json()
        .await
        .map_err(|e| CdpError::Unavailable(format!("{endpoint}: bad metadata: {e}")))?;

    meta["webSocketDebuggerUrl"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            CdpError::Unavailable(format!("{endpoint}: no webSocketDebuggerUrl in metadata"))
        })
}

// ---------------------------------------------------------------------------
// BrowserHandle — lazily-connected, reusable, invalidate-on-error
// ---------------------------------------------------------------------------

/// Owns the process-lifetime browser channel.
///
/// Exactly one physical channel is reused across fetches within a run. A
/// connection-level failure drops the cached client so the next call
/// retries from scratch; protocol-level failures keep the channel.
pub struct BrowserHandle {
    config: BrowserConfig,
    client: Option<CdpClient>,
}

impl BrowserHandle {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Cheap reachability check against the debug endpoint.
    pub async fn probe(&self) -> bool {
        let endpoint = format!(
            "http://{}:{}/json/version",
            self.config.host, self.config.port
        );
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };
        match client.get(&endpoint).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Render a page, connecting the channel on first use.
    pub async fn fetch_page(&mut self, url: &str) -> Result<RenderedPage, CdpError> {
        if self.client.is_none() {
            self.client = Some(CdpClient::connect(&self.config).await?);
        }

        // Invalidate-and-recreate on connection error is an explicit state
        // transition: the stale channel is dropped here, not on next use.
        let client = self.client.as_mut().expect("client populated above");
        match client.fetch_page(url).await {
            Err(e @ CdpError::Connection(_)) => {
                warn!(error = %e, "browser channel lost, dropping cached client");
                self.client = None;
                Err(e)
            }
            other => other,
        }
    }
}
