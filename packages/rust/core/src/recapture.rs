//! Re-capture mode: refresh published Notion assets and write the result
//! back to the corpus.
//!
//! Unlike the sync loop this mode is browser-only, so an unreachable
//! browser fails the whole run up front instead of skipping items.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use resourcesync_corpus::CorpusClient;
use resourcesync_fetch::ResourceFetcher;
use resourcesync_shared::{CaptureMeta, ResourceSyncError, Result, SourceType, url_domain};
use resourcesync_store::{CaptureStore, url_to_filename};

use crate::BROWSER_LAUNCH_HINT;

#[derive(Debug, Clone)]
pub struct RecaptureOptions {
    /// Preview only: list the assets that would be refreshed.
    pub dry_run: bool,
    /// Post-item sleep between browser fetches.
    pub delay: Duration,
}

impl Default for RecaptureOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            delay: Duration::from_millis(2000),
        }
    }
}

/// Outcome summary of one re-capture run.
#[derive(Debug, Default)]
pub struct RecaptureReport {
    /// Assets whose content was refreshed in both store and corpus.
    pub updated: usize,
    /// Per-asset failures: (name, reason).
    pub failed: Vec<(String, String)>,
    /// Assets with no published URL on record.
    pub skipped_no_url: usize,
    /// Asset names that would be refreshed (dry-run only).
    pub planned: Vec<String>,
}

/// Refresh every published asset's content from its live page.
///
/// A capture that lands in the store but fails the corpus write counts as
/// failed; the next run re-fetches it and retries the write.
pub async fn run_recapture<F: ResourceFetcher>(
    corpus: &CorpusClient,
    store: &CaptureStore,
    fetcher: &mut F,
    opts: &RecaptureOptions,
) -> Result<RecaptureReport> {
    let assets = corpus.list_notion_assets().await?;
    let mut report = RecaptureReport::default();

    if assets.is_empty() {
        return Ok(report);
    }

    // Every item needs the browser, so probe before touching anything —
    // including before a dry-run preview.
    if !fetcher.browser_available().await {
        return Err(ResourceSyncError::BrowserUnavailable(format!(
            "browser-driven re-capture requires a reachable browser; {BROWSER_LAUNCH_HINT}"
        )));
    }

    info!(count = assets.len(), "re-capturing published assets");

    let last_index = assets.len() - 1;
    for (i, asset) in assets.iter().enumerate() {
        let Some(url) = asset.published_url.as_deref() else {
            report.skipped_no_url += 1;
            continue;
        };

        if opts.dry_run {
            report.planned.push(asset.name.clone());
            continue;
        }

        info!(item = i + 1, total = assets.len(), name = %asset.name, "re-capturing");

        match refresh_asset(corpus, store, fetcher, &asset.id, &asset.name, url).await {
            Ok(()) => report.updated += 1,
            Err(reason) => {
                warn!(name = %asset.name, error = %reason, "re-capture failed");
                report.failed.push((asset.name.clone(), reason));
            }
        }

        if i < last_index {
            tokio::time::sleep(opts.delay).await;
        }
    }

    info!(
        updated = report.updated,
        failed = report.failed.len(),
        skipped_no_url = report.skipped_no_url,
        "re-capture complete"
    );

    Ok(report)
}

async fn refresh_asset<F: ResourceFetcher>(
    corpus: &CorpusClient,
    store: &CaptureStore,
    fetcher: &mut F,
    asset_id: &str,
    name: &str,
    url: &str,
) -> std::result::Result<(), String> {
    let text = fetcher
        .fetch(SourceType::Notion, url)
        .await
        .map_err(|e| e.to_string())?;

    let domain = url_domain(url);
    let meta = CaptureMeta {
        url: url.to_string(),
        domain: domain.clone(),
        link_text: Some(name.to_string()),
        source_post: None,
        extracted_at: Utc::now(),
        content_length: text.chars().count(),
        method: "cdp".to_string(),
        format: Some("markdown".to_string()),
    };
    store
        .write(&url_to_filename(url, &domain), &text, &meta)
        .map_err(|e| e.to_string())?;

    // The file is already saved at this point; a corpus failure still marks
    // the asset failed so the write is retried next run.
    corpus
        .update_asset_content(asset_id, &text)
        .await
        .map_err(|e| e.to_string())
}
