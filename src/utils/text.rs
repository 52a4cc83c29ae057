//! Plain-text extraction from HTML documents and feed markup.

use scraper::{ElementRef, Html};

/// Element kinds whose text never counts as content.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "iframe", "svg"];

/// Extract the visible text of a document, whitespace-collapsed and bounded
/// to `max_chars` characters.
pub fn extract_text(document: &Html, max_chars: usize) -> String {
    let mut buf = String::new();
    collect_text(document.root_element(), &mut buf);
    truncate_chars(&collapse_whitespace(&buf), max_chars)
}

fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                buf.push_str(text);
                buf.push(' ');
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&child.value().name()) {
                collect_text(child, buf);
            }
        }
    }
}

/// Remove every `<...>` span, replacing it with a single space, then collapse
/// whitespace and bound the result to `max_chars` characters.
///
/// An unterminated `<` is kept as literal text.
pub fn strip_tags(markup: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push(' ');
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    truncate_chars(&collapse_whitespace(&out), max_chars)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
