//! Classifies the edit point of a completion request.
//!
//! The resolver works on raw lines, not a parse tree: while the user is
//! typing the manifest is usually not valid YAML.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{block_indent_width, indent_width, key_word_at};

/// A line that already carries `key: ` is a value edit for that key,
/// whether or not anything follows the space yet.
static INLINE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+): (.*)").unwrap());

/// Where the cursor sits relative to the manifest structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditContext {
    /// Top of the document, column zero: a root attribute is being typed.
    Root,
    /// Indented: either a nested attribute or an array/object element value.
    /// `parent` is the governing block key when the upward scan found one.
    Nested { parent: Option<String> },
    /// `key: ` already on the line; the value for `key` is being typed.
    InlineValue { key: String },
}

/// Classify the cursor position within `text`.
pub fn resolve(text: &str, line: usize, character: usize) -> EditContext {
    let lines: Vec<&str> = text.split('\n').collect();
    let Some(current) = lines.get(line).copied() else {
        return EditContext::Root;
    };

    if INLINE_VALUE.is_match(current) {
        if let Some(key) = inline_key(current) {
            return EditContext::InlineValue { key };
        }
    }

    if current.starts_with(' ') && character > 0 {
        return EditContext::Nested {
            parent: governing_parent(&lines, line),
        };
    }

    EditContext::Root
}

/// The attribute name on an inline `key: value` line, list markers and
/// indentation stripped.
fn inline_key(line: &str) -> Option<String> {
    let head = line.split(':').next()?;
    let key = head.trim_start_matches([' ', '-']).trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Scan state for the upward parent search.
enum Scan {
    /// Still looking at line `index`.
    Looking { index: usize },
    /// A block-opening key was found at `index`, starting at column `column`.
    Found { index: usize, column: usize },
    Exhausted,
}

/// Walk upward from `line` to the nearest block-opening key (a line whose
/// trimmed content ends with a colon) indented strictly less than the
/// current line. List markers count as indentation on candidate lines so a
/// `- plat:` element never governs its own siblings.
fn governing_parent(lines: &[&str], line: usize) -> Option<String> {
    let current_indent = indent_width(lines[line]);
    if line == 0 || current_indent == 0 {
        return None;
    }

    let mut state = Scan::Looking { index: line - 1 };
    loop {
        match state {
            Scan::Looking { index } => {
                let candidate = lines[index];
                let column = block_indent_width(candidate);
                if candidate.trim_end().ends_with(':') && column < current_indent {
                    state = Scan::Found { index, column };
                } else if index == 0 {
                    state = Scan::Exhausted;
                } else {
                    state = Scan::Looking { index: index - 1 };
                }
            }
            Scan::Found { index, column } => {
                return key_word_at(lines[index], column).map(str::to_string);
            }
            Scan::Exhausted => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "spec: v0.6\n\
unikraft:\n  \n\
targets:\n  - plat: qemu\n    arch: x86_64\n  - \n";

    #[test]
    fn top_level_blank_line_is_a_root_edit() {
        assert_eq!(resolve("", 0, 0), EditContext::Root);
        assert_eq!(resolve("spec: v0.6\n\n", 1, 0), EditContext::Root);
        // A bare key without a value space is still an attribute edit.
        assert_eq!(resolve("unikr", 0, 5), EditContext::Root);
    }

    #[test]
    fn key_colon_space_is_an_inline_value_edit() {
        assert_eq!(
            resolve("arch: ", 0, 6),
            EditContext::InlineValue {
                key: "arch".to_string()
            }
        );
        assert_eq!(
            resolve(DOC, 0, 8),
            EditContext::InlineValue {
                key: "spec".to_string()
            }
        );
    }

    #[test]
    fn inline_key_sees_through_list_markers() {
        assert_eq!(
            resolve(DOC, 4, 10),
            EditContext::InlineValue {
                key: "plat".to_string()
            }
        );
    }

    #[test]
    fn indented_blank_line_resolves_its_block_parent() {
        // Line 2 is "  " under "unikraft:".
        assert_eq!(
            resolve(DOC, 2, 2),
            EditContext::Nested {
                parent: Some("unikraft".to_string())
            }
        );
    }

    #[test]
    fn list_element_lines_resolve_to_the_array_attribute() {
        // Line 6 is "  - " under "targets:"; the "- plat: qemu" element in
        // between must not be mistaken for the parent.
        assert_eq!(
            resolve(DOC, 6, 4),
            EditContext::Nested {
                parent: Some("targets".to_string())
            }
        );
    }

    #[test]
    fn missing_ancestor_degrades_to_an_unknown_parent() {
        // An indented cursor with no ancestor at all, even on the first
        // line, is still a nested edit with no known parent.
        let text = "  \n";
        assert_eq!(resolve(text, 0, 2), EditContext::Nested { parent: None });
        let text = "key value\n  \n";
        assert_eq!(resolve(text, 1, 2), EditContext::Nested { parent: None });
    }
}
