//! Application configuration for resourcesync.
//!
//! User config lives at `~/.resourcesync/resourcesync.toml`.
//! CLI flags override config file values, which override defaults.
//! Corpus credentials are read from the environment, never stored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResourceSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "resourcesync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".resourcesync";

// ---------------------------------------------------------------------------
// Config structs (matching resourcesync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote browser (DevTools endpoint) settings.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Capture store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Document corpus settings.
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Fetch pacing and thresholds.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Host of the browser debug endpoint.
    #[serde(default = "default_browser_host")]
    pub host: String,

    /// Port of the browser debug endpoint.
    #[serde(default = "default_browser_port")]
    pub port: u16,

    /// Seconds to wait for the page-load event before proceeding anyway.
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,

    /// Fixed settle delay after load, allowing deferred script rendering.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            host: default_browser_host(),
            port: default_browser_port(),
            load_timeout_secs: default_load_timeout_secs(),
            settle_secs: default_settle_secs(),
        }
    }
}

fn default_browser_host() -> String {
    "127.0.0.1".into()
}
fn default_browser_port() -> u16 {
    9222
}
fn default_load_timeout_secs() -> u64 {
    60
}
fn default_settle_secs() -> u64 {
    6
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding `<name>.txt` / `<name>.json` capture pairs.
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> String {
    "data/resources".into()
}

/// `[corpus]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Name of the env var holding the corpus base URL.
    #[serde(default = "default_corpus_url_env")]
    pub base_url_env: String,

    /// Name of the env var holding the service key (never the key itself).
    #[serde(default = "default_corpus_key_env")]
    pub service_key_env: String,

    /// Maximum documents fetched per corpus query.
    #[serde(default = "default_corpus_limit")]
    pub query_limit: u32,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            base_url_env: default_corpus_url_env(),
            service_key_env: default_corpus_key_env(),
            query_limit: default_corpus_limit(),
        }
    }
}

fn default_corpus_url_env() -> String {
    "CORPUS_BASE_URL".into()
}
fn default_corpus_key_env() -> String {
    "CORPUS_SERVICE_KEY".into()
}
fn default_corpus_limit() -> u32 {
    500
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Post-item sleep after a browser-driven fetch.
    #[serde(default = "default_browser_delay_ms")]
    pub browser_delay_ms: u64,

    /// Post-item sleep after a direct HTTP fetch.
    #[serde(default = "default_http_delay_ms")]
    pub http_delay_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            browser_delay_ms: default_browser_delay_ms(),
            http_delay_ms: default_http_delay_ms(),
        }
    }
}

fn default_browser_delay_ms() -> u64 {
    2000
}
fn default_http_delay_ms() -> u64 {
    500
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.resourcesync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ResourceSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.resourcesync/resourcesync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Write a default config file if none exists yet. Returns its path.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ResourceSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        let toml_str = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ResourceSyncError::config(format!("serialize default config: {e}")))?;
        std::fs::write(&path, toml_str).map_err(|e| ResourceSyncError::io(&path, e))?;
    }

    Ok(path)
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ResourceSyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ResourceSyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Resolved corpus credentials, read from the environment.
#[derive(Debug, Clone)]
pub struct CorpusCredentials {
    pub base_url: String,
    pub service_key: String,
}

/// Read the corpus base URL and service key from the configured env vars.
pub fn corpus_credentials(config: &AppConfig) -> Result<CorpusCredentials> {
    let base_url = std::env::var(&config.corpus.base_url_env).map_err(|_| {
        ResourceSyncError::config(format!(
            "corpus base URL not found. Set the {} environment variable.",
            config.corpus.base_url_env
        ))
    })?;
    let service_key = std::env::var(&config.corpus.service_key_env).map_err(|_| {
        ResourceSyncError::config(format!(
            "corpus service key not found. Set the {} environment variable.",
            config.corpus.service_key_env
        ))
    })?;

    if base_url.is_empty() || service_key.is_empty() {
        return Err(ResourceSyncError::config(
            "corpus credentials must be non-empty",
        ));
    }

    Ok(CorpusCredentials {
        base_url: base_url.trim_end_matches('/').to_string(),
        service_key,
    })
}
