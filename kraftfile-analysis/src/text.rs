//! Cursor-relative helpers over raw manifest lines.
//!
//! All three engines are text-first: they operate on the unparsed line the
//! cursor sits on, not on a parse tree.

/// The contiguous run of non-space characters touching `char_index`.
///
/// Scans left and right from the index; returns `None` when the index is
/// past the end of the line.
pub fn word_at(line: &str, char_index: usize) -> Option<&str> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    if char_index > chars.len() {
        return None;
    }

    // The left scan starts on the cursor character itself; a cursor sitting
    // on a space therefore yields no word, while a cursor one past the end
    // of the line picks up the trailing token.
    let mut start = char_index;
    loop {
        match chars.get(start.wrapping_sub(1)) {
            _ if start == 0 => break,
            Some((_, ' ')) => break,
            _ => start -= 1,
        }
    }
    if let Some((_, ' ')) = chars.get(char_index) {
        return None;
    }

    let mut end = char_index;
    while end < chars.len() && chars[end].1 != ' ' {
        end += 1;
    }
    if start >= end {
        return None;
    }

    let byte_start = chars[start].0;
    let byte_end = if end == chars.len() {
        line.len()
    } else {
        chars[end].0
    };
    Some(&line[byte_start..byte_end])
}

/// `word_at` with a trailing colon removed, the form used for schema lookup.
pub fn key_word_at(line: &str, char_index: usize) -> Option<&str> {
    word_at(line, char_index).map(strip_trailing_colon)
}

pub fn strip_trailing_colon(word: &str) -> &str {
    word.strip_suffix(':').unwrap_or(word)
}

/// Count of leading space characters.
pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

/// Indentation with `-` list markers treated as indentation, so that
/// `  - plat: qemu` and `    arch: x86_64` measure the same block depth.
pub fn block_indent_width(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '-').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_at_finds_the_token_touching_the_cursor() {
        assert_eq!(word_at("unikraft: stable", 3), Some("unikraft:"));
        assert_eq!(word_at("unikraft: stable", 12), Some("stable"));
    }

    #[test]
    fn word_at_accepts_a_cursor_at_either_token_edge() {
        assert_eq!(word_at("spec: v0.6", 0), Some("spec:"));
        assert_eq!(word_at("spec: v0.6", 10), Some("v0.6"));
    }

    #[test]
    fn word_at_rejects_out_of_bounds_and_gaps() {
        assert_eq!(word_at("spec: v0.6", 42), None);
        assert_eq!(word_at("a  b", 2), None);
        assert_eq!(word_at("", 0), None);
    }

    #[test]
    fn word_at_on_a_space_yields_nothing() {
        assert_eq!(word_at("unikraft: stable", 9), None);
    }

    #[test]
    fn key_word_drops_the_colon() {
        assert_eq!(key_word_at("unikraft:", 2), Some("unikraft"));
        assert_eq!(strip_trailing_colon("targets:"), "targets");
        assert_eq!(strip_trailing_colon("targets"), "targets");
    }

    #[test]
    fn indentation_measures() {
        assert_eq!(indent_width("    arch: x86_64"), 4);
        assert_eq!(indent_width("arch: x86_64"), 0);
        assert_eq!(block_indent_width("  - plat: qemu"), 4);
    }
}
