//! Post-conversion cleanup passes for normalized text.
//!
//! Each pass is a function `&str -> String` applied in sequence after the
//! Markdown conversion: drop known platform-chrome lines, then collapse
//! excess blank lines.

use std::sync::LazyLock;

use regex::Regex;

/// Chrome lines injected by the platform around real content. Whole-line or
/// line-prefix matches, case-insensitive.
static CHROME_LINE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*Skip to content\s*$",
        r"^\s*\[Skip to content\]",
        r"^\s*You.re almost there",
        r"^\s*\[?Sign up or login\]?",
        r"^\s*Share\s*$",
        r"^\s*Made with\s",
        r"^\s*Try Notion\s*$",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("valid regex"))
    .collect()
});

static MULTI_BLANK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Drop lines matching the chrome patterns.
pub(crate) fn strip_chrome_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !CHROME_LINE_RES.iter().any(|re| re.is_match(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of three or more newlines into exactly two.
pub(crate) fn collapse_blank_lines(text: &str) -> String {
    MULTI_BLANK_RE.replace_all(text, "\n\n").to_string()
}
