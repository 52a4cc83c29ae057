//! Heuristic headline synthesis from raw content.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::text::collapse_whitespace;

/// Title used when there is no content at all.
pub const UNTITLED: &str = "Untitled Content";

/// Longest title produced, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Titles shorter than this are replaced by the content prefix.
const MIN_TITLE_CHARS: usize = 10;

const SENTENCE_ENDS: [&str; 3] = [". ", "! ", "? "];

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\.,\-:;!\?]").expect("title character pattern"));

/// Build a headline from raw content.
///
/// Takes the first sentence of the cleaned text, bounded to
/// [`MAX_TITLE_CHARS`]. A result that is too short falls back to a prefix
/// of the raw content. Can return an empty string for content that is
/// nothing but whitespace.
pub fn synthesize_title(content: &str) -> String {
    if content.is_empty() {
        return UNTITLED.to_string();
    }

    let cleaned = clean(content);
    let title = limit_at_whitespace(first_sentence(&cleaned)).trim();

    if title.chars().count() < MIN_TITLE_CHARS {
        return fallback_title(content);
    }
    title.to_string()
}

fn clean(content: &str) -> String {
    let collapsed = collapse_whitespace(content);
    DISALLOWED.replace_all(&collapsed, "").trim().to_string()
}

fn first_sentence(text: &str) -> &str {
    let end = SENTENCE_ENDS
        .iter()
        .filter_map(|e| text.find(e))
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

/// Cut to [`MAX_TITLE_CHARS`], backing off to the last whitespace when one
/// exists past the first character.
fn limit_at_whitespace(text: &str) -> &str {
    let Some((limit, _)) = text.char_indices().nth(MAX_TITLE_CHARS) else {
        return text;
    };
    let truncated = &text[..limit];
    match truncated.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &truncated[..idx],
        _ => truncated,
    }
}

fn fallback_title(content: &str) -> String {
    if content.chars().count() <= MAX_TITLE_CHARS {
        return content.trim().to_string();
    }
    format!("{}...", limit_at_whitespace(content).trim())
}
