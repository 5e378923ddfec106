//! The main sync loop: fetch every referenced-but-uncovered resource.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use resourcesync_corpus::CorpusClient;
use resourcesync_fetch::{FetchError, ResourceFetcher};
use resourcesync_shared::{
    CaptureMeta, NormalizedKey, ResourceRef, Result, SourceType, is_notion_host, url_domain,
};
use resourcesync_store::{CaptureStore, url_to_filename};

use crate::{BROWSER_LAUNCH_HINT, extract_references};

/// Per-run sync options, merged from config and CLI flags.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Preview only: compute the uncovered set and planned filenames,
    /// fetch and write nothing.
    pub dry_run: bool,
    /// Restrict the run to one source type.
    pub domain: Option<SourceType>,
    /// Post-item sleep after a browser-driven fetch.
    pub browser_delay: Duration,
    /// Post-item sleep after a direct HTTP fetch.
    pub http_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            domain: None,
            browser_delay: Duration::from_millis(2000),
            http_delay: Duration::from_millis(500),
        }
    }
}

/// Outcome summary of one sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Unique referenced keys found in the corpus.
    pub referenced: usize,
    /// Keys already present in the capture store.
    pub covered: usize,
    /// Uncovered items by source type, computed before fetching began.
    pub uncovered_by_type: BTreeMap<String, usize>,
    /// Successfully captured this run.
    pub extracted: usize,
    /// Per-item failures: (url, reason).
    pub failed: Vec<(String, String)>,
    /// Browser-driven items skipped because no browser was reachable.
    pub skipped_no_browser: usize,
    /// Planned capture filenames (dry-run only).
    pub planned: Vec<String>,
}

/// Run one incremental sync.
///
/// Sequential by design: items are processed in stable URL sort order with
/// a fixed post-item delay, and one item's failure never aborts the loop.
pub async fn run_sync<F: ResourceFetcher>(
    corpus: &CorpusClient,
    store: &CaptureStore,
    fetcher: &mut F,
    opts: &SyncOptions,
) -> Result<SyncReport> {
    // Discover
    let posts = corpus.list_posts().await?;
    let references = extract_references(&posts);

    // The store is the completion ledger; recompute coverage every run.
    let covered = store.covered_keys()?;

    let mut report = SyncReport {
        referenced: references.len(),
        covered: covered.len(),
        ..SyncReport::default()
    };

    // Filter: uncovered = referenced − covered, minus binary source types,
    // minus anything outside the optional allowlist.
    let mut items: Vec<(NormalizedKey, ResourceRef)> = references
        .into_iter()
        .filter(|(key, _)| !covered.contains_key(key))
        .filter(|(key, _)| key.source != SourceType::Gdrive)
        .filter(|(key, _)| opts.domain.is_none_or(|d| key.source == d))
        .collect();
    items.sort_by(|a, b| a.1.url.cmp(&b.1.url));

    for (key, _) in &items {
        *report
            .uncovered_by_type
            .entry(key.source.to_string())
            .or_insert(0) += 1;
    }

    info!(
        referenced = report.referenced,
        covered = report.covered,
        uncovered = items.len(),
        "computed uncovered set"
    );

    if items.is_empty() {
        return Ok(report);
    }

    // One reachability probe per run; browser-driven items are skipped, not
    // retried, once the mechanism is known to be unavailable.
    let needs_browser = items
        .iter()
        .any(|(key, resource)| is_browser_driven(key, &resource.url));
    let mut browser_available = if needs_browser && !opts.dry_run {
        let available = fetcher.browser_available().await;
        if !available {
            warn!(hint = BROWSER_LAUNCH_HINT, "browser unreachable, skipping browser-driven items");
        }
        available
    } else {
        false
    };

    let last_index = items.len() - 1;
    for (i, (key, resource)) in items.iter().enumerate() {
        let url = &resource.url;
        let domain = url_domain(url);
        let filename = url_to_filename(url, &domain);

        if opts.dry_run {
            report.planned.push(format!("{filename}.txt"));
            continue;
        }

        let browser_driven = is_browser_driven(key, url);
        if browser_driven && !browser_available {
            report.skipped_no_browser += 1;
            continue;
        }

        info!(item = i + 1, total = items.len(), source = %key.source, %url, "fetching");

        match fetcher.fetch(key.source, url).await {
            Ok(text) => {
                let meta = CaptureMeta {
                    url: url.clone(),
                    domain,
                    link_text: Some(url.clone()),
                    source_post: Some(resource.source_post.clone()),
                    extracted_at: Utc::now(),
                    content_length: text.chars().count(),
                    method: if browser_driven { "cdp" } else { "http" }.to_string(),
                    format: None,
                };
                store.write(&filename, &text, &meta)?;
                report.extracted += 1;
            }
            Err(e) => {
                warn!(%url, error = %e, terminal = e.is_terminal(), "fetch failed");
                if matches!(e, FetchError::BrowserUnavailable(_)) {
                    browser_available = false;
                }
                report.failed.push((url.clone(), e.to_string()));
            }
        }

        if i < last_index {
            let delay = if browser_driven {
                opts.browser_delay
            } else {
                opts.http_delay
            };
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        extracted = report.extracted,
        failed = report.failed.len(),
        skipped_no_browser = report.skipped_no_browser,
        "sync complete"
    );

    Ok(report)
}

/// Whether an item renders through the browser. Id-less Notion URLs
/// classify as Other but still need the browser channel.
fn is_browser_driven(key: &NormalizedKey, url: &str) -> bool {
    key.source == SourceType::Notion
        || (key.source == SourceType::Other && is_notion_host(url))
}
