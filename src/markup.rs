//! Markup helpers for emitted fragments: escaping, tag stripping, wrapping.

use once_cell::sync::Lazy;
use regex::Regex;

// Whole script/style elements, content included.
static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*?>.*?</script\s*>").expect("valid regex"));
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*?>.*?</style\s*>").expect("valid regex"));
static RE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").expect("valid regex"));
// A tag opens with a letter, `/`, `!` or `?`; `a < b` is left alone.
// An unterminated tag runs to the end of the input.
static RE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[A-Za-z/!?][^>]*(?:>|\z)").expect("valid regex"));

/// Escape text for embedding in HTML, attributes and comments included.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Remove nested markup from fragment text before it is wrapped.
///
/// Drops `<script>`/`<style>` elements with their content, then comments and
/// any remaining tags, then trims. Style and script syntax is left untouched.
pub fn strip_all_tags(text: &str) -> String {
    let text = RE_SCRIPT.replace_all(text, "");
    let text = RE_STYLE.replace_all(&text, "");
    let text = RE_COMMENT.replace_all(&text, "");
    let text = RE_TAG.replace_all(&text, "");
    text.trim().to_string()
}

pub fn style_block(css: &str) -> String {
    format!("<style>{}</style>", strip_all_tags(css))
}

pub fn script_block(js: &str) -> String {
    format!("<script>{}</script>", strip_all_tags(js))
}

/// Single-line diagnostic comment; the message is escaped so it cannot close the comment.
pub fn diagnostic_comment(label: &str, message: &str) -> String {
    format!("<!-- {}: {} -->", label, escape_html(message))
}
