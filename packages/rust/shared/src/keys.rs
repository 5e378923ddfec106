//! URL normalization into canonical dedup keys.
//!
//! Two URLs that the origin platform treats as the same resource must map to
//! the same [`NormalizedKey`], regardless of query strings, anchors, or
//! trailing punctuation. Matching is substring/pattern based rather than
//! full URL parsing so it tolerates the messy link shapes found in post
//! content.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Source platform classification for a referenced resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Notion page (notion.so / notion.site) — requires browser rendering.
    Notion,
    /// Google Docs document — fetched via the text export endpoint.
    Gdoc,
    /// Google Sheets spreadsheet — fetched via the CSV export endpoint.
    Gsheet,
    /// Google Drive folder or file — binary content, always skipped.
    Gdrive,
    /// Anything else; carried through for reporting but never fetched.
    Other,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceType::Notion => "notion",
            SourceType::Gdoc => "gdoc",
            SourceType::Gsheet => "gsheet",
            SourceType::Gdrive => "gdrive",
            SourceType::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "notion" => Ok(SourceType::Notion),
            "gdoc" => Ok(SourceType::Gdoc),
            "gsheet" => Ok(SourceType::Gsheet),
            "gdrive" => Ok(SourceType::Gdrive),
            "other" => Ok(SourceType::Other),
            other => Err(format!(
                "unknown source type {other:?} (expected notion, gdoc, gsheet, gdrive, other)"
            )),
        }
    }
}

/// Canonical dedup key: `(source type, stable identifier)`.
///
/// The dedup unit across both the document corpus and the capture store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedKey {
    pub source: SourceType,
    pub id: String,
}

impl NormalizedKey {
    pub fn new(source: SourceType, id: impl Into<String>) -> Self {
        Self {
            source,
            id: id.into(),
        }
    }
}

static NOTION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-f0-9]{32})\b").expect("valid regex"));

static GOOGLE_DOC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("valid regex"));

static DRIVE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:folders|d)/([a-zA-Z0-9_-]+)").expect("valid regex"));

/// Map a raw URL string to its canonical dedup key.
///
/// Total and deterministic: unrecognized shapes fall back to
/// `(Other, url)` rather than failing.
pub fn normalize_url(url: &str) -> NormalizedKey {
    // Notion: 32-char hex page id embedded in the path or query
    if url.contains("notion") {
        if let Some(caps) = NOTION_ID_RE.captures(url) {
            return NormalizedKey::new(SourceType::Notion, &caps[1]);
        }
    }

    // Google Docs/Sheets: id is the path segment after /d/
    if url.contains("google.com") && !url.contains("drive.google.com") {
        if let Some(caps) = GOOGLE_DOC_ID_RE.captures(url) {
            let source = if url.contains("spreadsheets") {
                SourceType::Gsheet
            } else {
                SourceType::Gdoc
            };
            return NormalizedKey::new(source, &caps[1]);
        }
    }

    // Google Drive folders and files
    if url.contains("drive.google.com") {
        if let Some(caps) = DRIVE_ID_RE.captures(url) {
            return NormalizedKey::new(SourceType::Gdrive, &caps[1]);
        }
    }

    NormalizedKey::new(SourceType::Other, url)
}

/// Whether a URL points at a Notion host, regardless of whether a page id
/// could be extracted. Id-less Notion URLs normalize to `(Other, url)` but
/// still render through the browser.
pub fn is_notion_host(url: &str) -> bool {
    url.contains("notion.so") || url.contains("notion.site")
}

/// Extract the bare domain from a URL (host with a leading `www.` removed).
pub fn url_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notion_urls_dedup_across_query_strings() {
        let a = normalize_url(
            "https://notion.so/My-Page-0123456789abcdef0123456789abcdef?pvs=4",
        );
        let b = normalize_url(
            "https://www.notion.so/My-Page-0123456789abcdef0123456789abcdef",
        );
        let c = normalize_url(
            "https://notion.site/My-Page-0123456789abcdef0123456789abcdef#heading",
        );
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.source, SourceType::Notion);
        assert_eq!(a.id, "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn gdoc_vs_gsheet_distinguished_by_path() {
        let doc = normalize_url("https://docs.google.com/document/d/abc_DEF-123/edit");
        assert_eq!(doc.source, SourceType::Gdoc);
        assert_eq!(doc.id, "abc_DEF-123");

        let sheet =
            normalize_url("https://docs.google.com/spreadsheets/d/abc_DEF-123/edit#gid=0");
        assert_eq!(sheet.source, SourceType::Gsheet);
        assert_eq!(sheet.id, "abc_DEF-123");
    }

    #[test]
    fn same_doc_different_view_params_same_key() {
        let a = normalize_url("https://docs.google.com/document/d/xyz789/edit?usp=sharing");
        let b = normalize_url("https://docs.google.com/document/d/xyz789/view");
        assert_eq!(a, b);
    }

    #[test]
    fn drive_folder_classified() {
        let key = normalize_url("https://drive.google.com/drive/folders/1AbC-xYz_9");
        assert_eq!(key.source, SourceType::Gdrive);
        assert_eq!(key.id, "1AbC-xYz_9");

        let file = normalize_url("https://drive.google.com/file/d/9zZ_a/view");
        assert_eq!(file.source, SourceType::Gdrive);
    }

    #[test]
    fn unknown_hosts_fall_back_to_other() {
        let url = "https://example.com/some/page?x=1";
        let key = normalize_url(url);
        assert_eq!(key.source, SourceType::Other);
        assert_eq!(key.id, url);
    }

    #[test]
    fn notion_marker_required_for_hex_match() {
        // 32 hex chars on a non-Notion host must not classify as Notion
        let key = normalize_url("https://example.com/0123456789abcdef0123456789abcdef");
        assert_eq!(key.source, SourceType::Other);
    }

    #[test]
    fn notion_host_detected_without_page_id() {
        assert!(is_notion_host("https://notion.so/pricing"));
        assert!(is_notion_host("https://acme.notion.site/landing"));
        assert!(!is_notion_host("https://example.com/page"));
        assert!(!is_notion_host("https://docs.google.com/document/d/x/edit"));
    }

    #[test]
    fn url_domain_strips_www() {
        assert_eq!(url_domain("https://www.notion.so/p"), "notion.so");
        assert_eq!(url_domain("https://docs.google.com/d/x"), "docs.google.com");
        assert_eq!(url_domain("not a url"), "");
    }
}
