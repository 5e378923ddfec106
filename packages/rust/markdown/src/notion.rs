//! Notion-specific block rewriting.
//!
//! Notion renders code blocks as deeply nested span soup and callouts as
//! styled divs; both are rewritten into generic `<pre><code>` and
//! `<blockquote>` equivalents before Markdown conversion. Code-block text
//! prefers the out-of-band `innerText` captured from the live DOM, since the
//! static markup fragments it beyond reliable reconstruction.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Language labels Notion prepends to a code block's rendered text.
static LANGUAGE_LABELS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "javascript",
        "python",
        "plain text",
        "text",
        "html",
        "css",
        "json",
        "typescript",
        "bash",
        "shell",
        "xml",
        "yaml",
        "markdown",
        "sql",
        "java",
        "c",
        "c++",
        "ruby",
        "go",
        "rust",
        "swift",
        "kotlin",
        "php",
        "r",
        "scala",
        "dart",
        "lua",
        "perl",
        "powershell",
    ]
    .into_iter()
    .collect()
});

/// Rewrite Notion code blocks and callouts into generic structural HTML.
///
/// The i-th out-of-band text replaces the i-th code block in document
/// order; blocks beyond the list fall back to the static element text.
pub(crate) fn rewrite_blocks(html: &str, code_block_texts: &[String]) -> String {
    let doc = Html::parse_document(html);

    let code_sel = Selector::parse(r#"div[class*="notion-code-block"]"#).expect("valid selector");
    let callout_sel =
        Selector::parse(r#"div[class*="notion-callout-block"]"#).expect("valid selector");

    // Work on this document's own serialization so subtree matches are exact.
    let mut result = doc.html();

    for (i, block) in doc.select(&code_sel).enumerate() {
        let text = match code_block_texts.get(i) {
            Some(rendered) => rendered.clone(),
            None => block.text().collect::<Vec<_>>().join(""),
        };
        let body = strip_language_label(&text);
        let replacement = format!("<pre><code>{}</code></pre>", escape_html(body.trim()));
        result = result.replacen(&block.html(), &replacement, 1);
    }

    for callout in doc.select(&callout_sel) {
        let text = callout.text().collect::<Vec<_>>().join("\n");
        let replacement = format!("<blockquote>{}</blockquote>", escape_html(text.trim()));
        result = result.replacen(&callout.html(), &replacement, 1);
    }

    result
}

/// Drop the first line when it is a recognized language label.
fn strip_language_label(text: &str) -> String {
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if LANGUAGE_LABELS.contains(first.trim().to_lowercase().as_str()) => {
            lines.collect::<Vec<_>>().join("\n")
        }
        _ => text.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;

    #[test]
    fn code_block_uses_out_of_band_text() {
        let html = r#"<html><body>
            <div class="notion-code-block foo">
                <span>pr</span><span>int</span><span>(1)</span>
            </div>
        </body></html>"#;
        let texts = vec!["print(1)".to_string()];

        let text = normalize(html, &texts);
        assert!(text.contains("print(1)"));
        // The fragmented span text must not leak through.
        assert!(!text.contains("pr int"));
    }

    #[test]
    fn ith_text_replaces_ith_block_in_document_order() {
        let html = r#"<html><body>
            <div class="notion-code-block">first static</div>
            <p>between</p>
            <div class="notion-code-block">second static</div>
        </body></html>"#;
        let texts = vec!["alpha()".to_string(), "beta()".to_string()];

        let text = normalize(html, &texts);
        let alpha = text.find("alpha()").expect("first block present");
        let beta = text.find("beta()").expect("second block present");
        assert!(alpha < beta);
        assert!(!text.contains("first static"));
        assert!(!text.contains("second static"));
    }

    #[test]
    fn leading_language_label_is_dropped() {
        let body = strip_language_label("python\nprint(1)");
        assert_eq!(body, "print(1)");

        let mixed_case = strip_language_label("Plain Text\nhello");
        assert_eq!(mixed_case, "hello");
    }

    #[test]
    fn code_text_is_trimmed_both_ends() {
        let html = r#"<html><body>
            <div class="notion-code-block">x</div>
        </body></html>"#;
        let texts = vec!["\n  print(1)\n\n".to_string()];

        let rewritten = rewrite_blocks(html, &texts);
        assert!(rewritten.contains("<pre><code>print(1)</code></pre>"));
    }

    #[test]
    fn non_label_first_line_is_kept() {
        let body = strip_language_label("print(1)\nprint(2)");
        assert_eq!(body, "print(1)\nprint(2)");
    }

    #[test]
    fn missing_out_of_band_text_falls_back_to_static() {
        let html = r#"<html><body>
            <div class="notion-code-block">static_code()</div>
        </body></html>"#;

        let text = normalize(html, &[]);
        assert!(text.contains("static_code()"));
    }

    #[test]
    fn callout_becomes_blockquote() {
        let html = r#"<html><body>
            <div class="notion-callout-block"><div>Watch out</div><div>for this</div></div>
        </body></html>"#;

        let text = normalize(html, &[]);
        assert!(text.contains("> Watch out"), "got: {text}");
    }

    #[test]
    fn code_text_with_markup_chars_survives() {
        let html = r#"<html><body>
            <div class="notion-code-block">x</div>
        </body></html>"#;
        let texts = vec!["if a < b && b > c {}".to_string()];

        let text = normalize(html, &texts);
        assert!(text.contains("if a < b && b > c {}"));
    }
}
