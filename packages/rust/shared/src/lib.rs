//! Shared types, error model, and configuration for resourcesync.
//!
//! This crate is the foundation depended on by all other resourcesync crates.
//! It provides:
//! - [`ResourceSyncError`] — the unified infrastructure error type
//! - URL normalization ([`normalize_url`], [`NormalizedKey`], [`SourceType`])
//! - Domain types ([`CaptureMeta`], [`ResourceRef`], [`PostDocument`])
//! - Configuration ([`AppConfig`], config loading, corpus credentials)

pub mod config;
pub mod error;
pub mod keys;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, CorpusConfig, CorpusCredentials, LimitsConfig, StoreConfig,
    config_dir, config_file_path, corpus_credentials, init_config, load_config, load_config_from,
};
pub use error::{ResourceSyncError, Result};
pub use keys::{NormalizedKey, SourceType, is_notion_host, normalize_url, url_domain};
pub use types::{
    CaptureMeta, MANIFEST_STEM, NotionAsset, PostDocument, ResourceRef, SourcePost,
};
