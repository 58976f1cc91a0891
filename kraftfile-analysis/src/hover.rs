//! Hover documentation for the word under the cursor.

use crate::schema::SchemaRegistry;
use crate::text::key_word_at;

/// Rendered hover block for a recognised attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverContent {
    pub title: &'static str,
    pub detail: &'static str,
    pub documentation: &'static str,
}

impl HoverContent {
    /// Markdown rendering used by the transport layer.
    pub fn to_markdown(&self) -> String {
        format!(
            "## `{}`  \n  \n**{}**  \n  \n{}",
            self.title, self.detail, self.documentation
        )
    }
}

/// Resolve the hovered word to a schema entry.
///
/// Comment lines and positions past the end of the line never hover.
pub fn hover(text: &str, line: usize, character: usize) -> Option<HoverContent> {
    let line_str = text.split('\n').nth(line)?;
    if line_str.starts_with('#') || line_str.chars().count() < character {
        return None;
    }

    let word = key_word_at(line_str, character)?;
    let spec = SchemaRegistry::global().lookup(word)?;
    Some(HoverContent {
        title: spec.primary_label,
        detail: spec.detail,
        documentation: spec.documentation,
    })
}
