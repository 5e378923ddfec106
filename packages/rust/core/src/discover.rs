//! Resource reference discovery in post content.
//!
//! Two patterns are recognized: Notion page links and Google Docs/Sheets
//! links. Markdown and HTML punctuation trailing a URL is trimmed before
//! normalization. The first occurrence per normalized key wins; later
//! duplicates, including ones from other posts, are dropped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use resourcesync_shared::{NormalizedKey, PostDocument, ResourceRef, SourcePost, normalize_url};

static NOTION_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://(?:www\.)?notion\.(?:so|site)/[^\s)">\]]+"#).expect("valid regex")
});

static GDOCS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://docs\.google\.com/(?:document|spreadsheets)/d/[^\s)">\]]+"#)
        .expect("valid regex")
});

/// Extract every recognized resource URL from the given posts and build the
/// reference index keyed by normalized key.
pub fn extract_references(posts: &[PostDocument]) -> HashMap<NormalizedKey, ResourceRef> {
    let mut refs: HashMap<NormalizedKey, ResourceRef> = HashMap::new();

    for post in posts {
        let Some(content) = post.content.as_deref() else {
            continue;
        };

        let matches = NOTION_URL_RE
            .find_iter(content)
            .chain(GDOCS_URL_RE.find_iter(content));

        for m in matches {
            let url = m.as_str().trim_end_matches([')', '.', ',', ';']).to_string();
            let key = normalize_url(&url);

            refs.entry(key).or_insert_with(|| ResourceRef {
                url,
                source_post: SourcePost {
                    asset_id: post.asset_id.clone(),
                    title: post.name.clone(),
                },
            });
        }
    }

    debug!(count = refs.len(), posts = posts.len(), "extracted resource references");
    refs
}
