//! The local capture store: one `<name>.txt` body plus `<name>.json`
//! metadata pair per captured resource.
//!
//! The store is the completion ledger for the sync: a key counts as covered
//! when a metadata file whose `url` normalizes to that key exists. Writes
//! are whole-file, so a partially written body from an interrupted run is
//! simply overwritten on the next attempt. Records are never deleted here.

mod filename;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use resourcesync_shared::{
    CaptureMeta, MANIFEST_STEM, NormalizedKey, ResourceSyncError, Result, normalize_url,
};

pub use filename::url_to_filename;

/// A covered entry discovered by scanning existing metadata files.
#[derive(Debug, Clone)]
pub struct CoveredEntry {
    pub url: String,
    pub file_stem: String,
    pub content_length: usize,
}

/// Handle to the capture store directory.
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the store directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ResourceSyncError::io(&self.dir, e))
    }

    /// Scan metadata files and build the covered-key map.
    ///
    /// Keys are re-derived by normalizing each stored `url`, so entries
    /// keyed by raw URL from older runs still count. Unreadable files are
    /// skipped, not fatal — a corrupt entry just looks uncovered.
    pub fn covered_keys(&self) -> Result<HashMap<NormalizedKey, CoveredEntry>> {
        let mut covered = HashMap::new();

        if !self.dir.exists() {
            return Ok(covered);
        }

        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| ResourceSyncError::io(&self.dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| ResourceSyncError::io(&self.dir, e))?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == MANIFEST_STEM {
                continue;
            }

            let meta: Value = match std::fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str(&raw).ok())
            {
                Some(meta) => meta,
                None => {
                    warn!(?path, "skipping unreadable metadata file");
                    continue;
                }
            };

            let url = meta["url"].as_str().unwrap_or_default().to_string();
            let key = normalize_url(&url);
            let content_length = meta["content_length"].as_u64().unwrap_or(0) as usize;

            covered.insert(
                key,
                CoveredEntry {
                    url,
                    file_stem: stem.to_string(),
                    content_length,
                },
            );
        }

        debug!(count = covered.len(), dir = ?self.dir, "scanned covered keys");
        Ok(covered)
    }

    /// Persist a capture: replace the text body wholesale and merge the
    /// metadata over any existing record.
    ///
    /// Merge semantics: fields in `meta` overwrite, fields only present in
    /// the existing file are preserved.
    pub fn write(&self, stem: &str, body: &str, meta: &CaptureMeta) -> Result<()> {
        self.ensure_dir()?;

        let txt_path = self.dir.join(format!("{stem}.txt"));
        std::fs::write(&txt_path, body).map_err(|e| ResourceSyncError::io(&txt_path, e))?;

        let json_path = self.dir.join(format!("{stem}.json"));
        let mut merged: Value = std::fs::read_to_string(&json_path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_else(|| Value::Object(Default::default()));

        let fresh = serde_json::to_value(meta)
            .map_err(|e| ResourceSyncError::Store(format!("serialize metadata: {e}")))?;

        if let (Value::Object(target), Value::Object(source)) = (&mut merged, fresh) {
            for (k, v) in source {
                target.insert(k, v);
            }
        }

        let pretty = serde_json::to_string_pretty(&merged)
            .map_err(|e| ResourceSyncError::Store(format!("serialize metadata: {e}")))?;
        std::fs::write(&json_path, pretty).map_err(|e| ResourceSyncError::io(&json_path, e))?;

        debug!(stem, bytes = body.len(), "capture written");
        Ok(())
    }

    /// Read back a capture body (primarily for tests and tooling).
    pub fn read_body(&self, stem: &str) -> Result<String> {
        let path = self.dir.join(format!("{stem}.txt"));
        std::fs::read_to_string(&path).map_err(|e| ResourceSyncError::io(&path, e))
    }

    /// Read back capture metadata as JSON.
    pub fn read_meta(&self, stem: &str) -> Result<Value> {
        let path = self.dir.join(format!("{stem}.json"));
        let raw = std::fs::read_to_string(&path).map_err(|e| ResourceSyncError::io(&path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| ResourceSyncError::Store(format!("parse {}: {e}", path.display())))
    }
}
