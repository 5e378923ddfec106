//! Rendered-HTML to Markdown normalization.
//!
//! Converts a raw browser-rendered document into clean structured text:
//! strips non-content subtrees, rewrites Notion-specific blocks into generic
//! structural equivalents (using out-of-band code-block texts captured from
//! the live DOM), converts to Markdown via `htmd`, and filters known page
//! chrome. If the conversion fails, a whitespace-collapsing tag stripper is
//! the fallback so a fetch still yields usable text.

mod cleanup;
mod notion;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

/// Tags whose entire subtree is non-content and gets removed up front.
const STRIPPED_TAGS: &[&str] = &["noscript", "script", "style", "svg", "nav", "footer", "header"];

/// Convert rendered HTML to clean Markdown.
///
/// `code_block_texts` are the rendered code-block contents in document
/// order, preferred over anything recoverable from the static markup.
/// The result may still be empty or trivially short; checking it against a
/// minimum-content threshold is the caller's responsibility.
pub fn normalize(html: &str, code_block_texts: &[String]) -> String {
    let stripped = strip_tag_subtrees(html);
    let rewritten = notion::rewrite_blocks(&stripped, code_block_texts);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec![
            "script", "style", "nav", "iframe", "noscript", "svg", "img", "button", "input",
            "form",
        ])
        .options(htmd::options::Options {
            heading_style: htmd::options::HeadingStyle::Atx,
            bullet_list_marker: htmd::options::BulletListMarker::Dash,
            ..Default::default()
        })
        .build();

    let markdown = match converter.convert(&rewritten) {
        Ok(md) => md,
        Err(e) => {
            warn!(error = %e, "markdown conversion failed, falling back to plain text");
            strip_to_text(&rewritten)
        }
    };

    let filtered = cleanup::strip_chrome_lines(&markdown);
    let collapsed = cleanup::collapse_blank_lines(&filtered);

    debug!(
        html_len = html.len(),
        text_len = collapsed.trim().len(),
        "normalized page content"
    );

    collapsed.trim().to_string()
}

/// Remove entire open-to-close subtrees for the stripped tag set.
///
/// Regex-based so it survives documents too mangled to parse; patterns span
/// lines and match case-insensitively.
fn strip_tag_subtrees(html: &str) -> String {
    static SUBTREE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        STRIPPED_TAGS
            .iter()
            .map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}>")).expect("valid regex")
            })
            .collect()
    });

    let mut result = html.to_string();
    for re in SUBTREE_RES.iter() {
        result = re.replace_all(&result, "").to_string();
    }
    result
}

/// Fallback conversion: strip all tags and collapse whitespace.
fn strip_to_text(html: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let text = TAG_RE.replace_all(html, " ");
    let text = WS_RE.replace_all(&text, " ");
    unescape_entities(text.trim())
}

/// Unescape the standard HTML entities (plus non-breaking spaces).
fn unescape_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_simple_page() {
        let html = "<html><body><h1>Hello</h1><p>Some text.</p></body></html>";
        let text = normalize(html, &[]);
        assert!(text.contains("# Hello"));
        assert!(text.contains("Some text."));
    }

    #[test]
    fn strips_script_and_style_subtrees() {
        let html = "<html><body>\
            <script>\nvar x = 1;\nconsole.log(x);\n</script>\
            <style>\n.a { color: red }\n</style>\
            <p>Visible.</p>\
            </body></html>";
        let text = normalize(html, &[]);
        assert!(text.contains("Visible."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn strips_nav_footer_header() {
        let html = "<html><body>\
            <header><a href=\"/\">Logo</a></header>\
            <nav><a href=\"/docs\">Docs</a></nav>\
            <p>Body content here.</p>\
            <footer>Copyright 2026</footer>\
            </body></html>";
        let text = normalize(html, &[]);
        assert!(text.contains("Body content here."));
        assert!(!text.contains("Copyright 2026"));
        assert!(!text.contains("Logo"));
    }

    #[test]
    fn strip_handles_multiline_and_mixed_case() {
        let html = "<SCRIPT type=\"text/javascript\">\nline1\nline2\n</SCRIPT><p>kept</p>";
        let stripped = strip_tag_subtrees(html);
        assert!(!stripped.contains("line1"));
        assert!(stripped.contains("kept"));
    }

    #[test]
    fn fallback_stripper_unescapes_entities() {
        let text = strip_to_text("<p>a &amp; b &lt;c&gt; &quot;d&quot; &#39;e&#39;&nbsp;f</p>");
        assert_eq!(text, "a & b <c> \"d\" 'e' f");
    }

    #[test]
    fn fallback_stripper_collapses_whitespace() {
        let text = strip_to_text("<div>  many\n\n   spaces\t here </div>");
        assert_eq!(text, "many spaces here");
    }

    #[test]
    fn headings_use_atx_markers() {
        let html = "<body><h2>Section</h2><p>x</p></body>";
        let text = normalize(html, &[]);
        assert!(text.contains("## Section"));
    }

    #[test]
    fn lists_become_bullets() {
        let html = "<body><ul><li>one</li><li>two</li></ul></body>";
        let text = normalize(html, &[]);
        assert!(text.contains("one"));
        assert!(text.contains("two"));
    }

    #[test]
    fn images_and_buttons_are_dropped() {
        let html = "<body><p>before</p><img src=\"x.png\" alt=\"pic\">\
            <button>Click me</button><p>after</p></body>";
        let text = normalize(html, &[]);
        assert!(text.contains("before"));
        assert!(text.contains("after"));
        assert!(!text.contains("Click me"));
        assert!(!text.contains("x.png"));
    }
}
