//! Core domain types for the resource harvesting pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filename stem reserved for the store manifest; never a capture record.
pub const MANIFEST_STEM: &str = "manifest";

// ---------------------------------------------------------------------------
// Corpus documents
// ---------------------------------------------------------------------------

/// A post document from the corpus, scanned for resource references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDocument {
    pub id: String,
    pub project_id: String,
    pub asset_id: String,
    pub name: String,
    /// Raw content; may be null in the corpus.
    #[serde(default)]
    pub content: Option<String>,
}

/// A published Notion asset from the corpus, used by the re-capture mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionAsset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub published_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Resource references
// ---------------------------------------------------------------------------

/// The post a resource reference was found in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePost {
    pub asset_id: String,
    pub title: String,
}

/// A resource URL extracted from post content. Ephemeral: recomputed each
/// run, never persisted directly.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    /// The first-seen raw URL for this key (unstripped, as found).
    pub url: String,
    pub source_post: SourcePost,
}

// ---------------------------------------------------------------------------
// Capture metadata
// ---------------------------------------------------------------------------

/// Metadata persisted alongside each captured text body.
///
/// On re-capture the stored JSON is merged field-by-field: fields present
/// here overwrite, unknown fields in the existing file are preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMeta {
    pub url: String,
    pub domain: String,
    /// Anchor text of the originating link; falls back to the URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_post: Option<SourcePost>,
    pub extracted_at: DateTime<Utc>,
    pub content_length: usize,
    /// Fetch mechanism: "cdp" for browser captures, "http" for exports.
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_meta_roundtrip() {
        let meta = CaptureMeta {
            url: "https://notion.so/Page-0123456789abcdef0123456789abcdef".into(),
            domain: "notion.so".into(),
            link_text: Some("My Page".into()),
            source_post: Some(SourcePost {
                asset_id: "a1".into(),
                title: "Post".into(),
            }),
            extracted_at: Utc::now(),
            content_length: 300,
            method: "cdp".into(),
            format: Some("markdown".into()),
        };

        let json = serde_json::to_string_pretty(&meta).expect("serialize");
        let parsed: CaptureMeta = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.content_length, 300);
        assert_eq!(parsed.method, "cdp");
        assert_eq!(parsed.source_post.unwrap().asset_id, "a1");
    }

    #[test]
    fn post_document_tolerates_null_content() {
        let json = r#"{"id":"1","project_id":"p","asset_id":"a","name":"n","content":null}"#;
        let doc: PostDocument = serde_json::from_str(json).expect("deserialize");
        assert!(doc.content.is_none());
    }
}
