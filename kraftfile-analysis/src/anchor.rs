//! Textual anchors for diagnostics.
//!
//! Diagnostics are attached to ranges found by searching the raw text for
//! the offending key, not by asking the parser for node positions. The
//! search can mis-anchor when a key name also appears inside an earlier
//! string value; everything lives here so a span-aware YAML parser can
//! replace it without touching the rule logic.

/// Byte range a diagnostic is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub start: usize,
    pub end: usize,
}

/// First occurrence of `key` at or after `from`, spanning the key text.
/// Falls back to the end-of-document anchor when the key never occurs.
pub fn key_anchor(text: &str, key: &str, from: usize) -> Anchor {
    match find_key(text, key, from) {
        Some(start) => Anchor {
            start,
            end: start + key.len(),
        },
        None => end_of_document(text),
    }
}

/// Offset of the first occurrence of `key` at or after `from`.
pub fn find_key(text: &str, key: &str, from: usize) -> Option<usize> {
    let from = from.min(text.len());
    text[from..].find(key).map(|pos| from + pos)
}

/// Offset of the next `"- "` list marker strictly after `from`.
pub fn list_marker_after(text: &str, from: usize) -> Option<usize> {
    find_key(text, "- ", from.saturating_add(1))
}

/// The conventional anchor for "this attribute is missing entirely":
/// one past the end of the document.
pub fn end_of_document(text: &str) -> Anchor {
    Anchor {
        start: text.len() + 1,
        end: text.len() + 2,
    }
}
