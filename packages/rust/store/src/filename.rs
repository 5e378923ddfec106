//! Deterministic capture filenames.
//!
//! The same URL always maps to the same filename across runs, so repeated
//! syncs overwrite in place instead of accumulating duplicates. The name
//! embeds a human-readable hint (slug or document id) plus a short URL hash
//! to keep distinct resources from colliding.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

static NOTION_SLUG_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-[a-f0-9]{32}$").expect("valid regex"));

/// Derive the filename stem for a captured URL.
pub fn url_to_filename(url: &str, domain: &str) -> String {
    let hash = short_hash(url);

    let path_parts: Vec<String> = Url::parse(url)
        .map(|u| {
            u.path()
                .split('/')
                .filter(|p| !p.is_empty())
                .map(|p| p.to_string())
                .collect()
        })
        .unwrap_or_default();

    if domain == "notion.so" || domain == "notion.site" {
        if let Some(last) = path_parts.last() {
            let slug = last.split('?').next().unwrap_or(last);
            let slug = NOTION_SLUG_ID_RE.replace(slug, "");
            return format!("notion_{slug}_{hash}");
        }
    } else if domain == "docs.google.com" {
        for (i, part) in path_parts.iter().enumerate() {
            if part == "d" {
                if let Some(doc_id) = path_parts.get(i + 1) {
                    let short_id: String = doc_id.chars().take(12).collect();
                    let doc_type = if url.contains("spreadsheets") {
                        "gsheet"
                    } else {
                        "gdoc"
                    };
                    return format!("{doc_type}_{short_id}_{hash}");
                }
            }
        }
    }

    let safe_domain = domain.replace('.', "_");
    format!("{safe_domain}_{hash}")
}

/// First 8 hex chars of the URL's SHA-256.
fn short_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_deterministic() {
        let url = "https://notion.so/My-Page-0123456789abcdef0123456789abcdef";
        let a = url_to_filename(url, "notion.so");
        let b = url_to_filename(url, "notion.so");
        assert_eq!(a, b);
    }

    #[test]
    fn notion_slug_strips_trailing_page_id() {
        let url = "https://notion.so/My-Page-0123456789abcdef0123456789abcdef";
        let name = url_to_filename(url, "notion.so");
        assert!(name.starts_with("notion_My-Page_"));
        assert!(!name.contains("0123456789abcdef0123456789abcdef"));
    }

    #[test]
    fn gdoc_filename_embeds_short_id() {
        let url = "https://docs.google.com/document/d/abcdefghijklmnop/edit";
        let name = url_to_filename(url, "docs.google.com");
        assert!(name.starts_with("gdoc_abcdefghijkl_"), "got {name}");
    }

    #[test]
    fn gsheet_prefix_selected_by_path_marker() {
        let url = "https://docs.google.com/spreadsheets/d/sheet123/edit";
        let name = url_to_filename(url, "docs.google.com");
        assert!(name.starts_with("gsheet_sheet123_"));
    }

    #[test]
    fn unknown_domain_uses_safe_domain() {
        let url = "https://some.example.com/a/b";
        let name = url_to_filename(url, "some.example.com");
        assert!(name.starts_with("some_example_com_"));
    }

    #[test]
    fn different_urls_get_different_names() {
        let a = url_to_filename("https://example.com/a", "example.com");
        let b = url_to_filename("https://example.com/b", "example.com");
        assert_ne!(a, b);
    }
}
