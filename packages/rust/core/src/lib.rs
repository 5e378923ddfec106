//! Sync orchestration: discover → filter → fetch → persist → report.
//!
//! The capture store is the completion ledger. Each run recomputes the
//! uncovered set from scratch (referenced keys minus covered keys), fetches
//! sequentially in stable URL order, and reports typed per-item outcomes.
//! Nothing is queued across runs; a failed item is simply still uncovered
//! next time.

mod discover;
pub mod recapture;
pub mod sync;

pub use discover::extract_references;
pub use recapture::{RecaptureOptions, RecaptureReport, run_recapture};
pub use sync::{SyncOptions, SyncReport, run_sync};

/// Operator hint logged when browser-driven items cannot be fetched.
pub(crate) const BROWSER_LAUNCH_HINT: &str =
    "launch a browser with remote debugging enabled, e.g. \
     chrome --remote-debugging-port=9222 --user-data-dir=~/.chrome-debug-profile";
