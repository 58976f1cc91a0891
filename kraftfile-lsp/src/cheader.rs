//! `#include` intelligence for C sources in a Unikraft project.
//!
//! The same text-first approach as the manifest engines: completion works
//! on the cursor line, validation scans the raw text line by line. The
//! header search path comes from the `includePath` server setting; with
//! no search path configured only the directive snippet is offered.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kraftfile_analysis::completion::CompletionCandidate;
use kraftfile_analysis::text::word_at;
use kraftfile_analysis::validate::{Diagnostic, Severity, DIAGNOSTIC_SOURCE};
use lsp_types::CompletionItemKind;
use tracing::debug;

const EMPTY_INCLUSION_ERROR: &str = "Error: Empty inclusion";
const REPEATED_INCLUSION_ERROR: &str = "Error: Repeated inclusion";

/// Extensions of the C-relevant files the server assists with.
pub const C_FILE_EXTENSIONS: &[&str] = &["c", "cpp", "h"];

/// True when `path` (a filesystem path or URI path) names a C source or
/// header file.
pub fn is_c_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| C_FILE_EXTENSIONS.contains(&ext))
}

/// Candidates for the cursor position in a C file.
///
/// A word starting with `#` offers the `include` directive itself; a
/// quoted word on an `#include` line offers every header reachable
/// through `include_paths`, inserted relative to the edited document.
pub fn complete(
    text: &str,
    line: usize,
    character: usize,
    document_path: &str,
    workspace_root: Option<&Path>,
    include_paths: &[String],
) -> Vec<CompletionCandidate> {
    let Some(line_str) = text.split('\n').nth(line) else {
        return Vec::new();
    };
    let Some(word) = word_at(line_str, character) else {
        return Vec::new();
    };

    if !include_paths.is_empty()
        && line_str.trim_start().starts_with("#include")
        && word.starts_with('"')
        && word.ends_with('"')
    {
        return header_candidates(document_path, workspace_root, include_paths);
    }
    if word.starts_with('#') {
        return vec![include_directive_candidate()];
    }
    Vec::new()
}

fn include_directive_candidate() -> CompletionCandidate {
    CompletionCandidate::new("include", CompletionItemKind::SNIPPET)
        .detail("It is used to import header files in C.")
        .doc("```  \n#include \"sample.h\"  \n```")
        .insert("include ")
}

fn header_candidates(
    document_path: &str,
    workspace_root: Option<&Path>,
    include_paths: &[String],
) -> Vec<CompletionCandidate> {
    let root = workspace_root.and_then(Path::to_str).unwrap_or("");
    let ascent = ascent_prefix(document_path, root);
    let root_prefix = format!("{root}/");

    let mut items = Vec::new();
    for path in include_paths {
        let mut files = Vec::new();
        if let Err(err) = collect_files(Path::new(path), &mut files) {
            debug!(%err, path, "skipping unreadable include path");
            continue;
        }
        for file in files {
            let Some(file) = file.to_str() else {
                continue;
            };
            let name = file.rsplit('/').next().unwrap_or(file);
            let relative = file.strip_prefix(&root_prefix).unwrap_or(file);
            let insert = format!("{ascent}{relative}");
            items.push(
                CompletionCandidate::new(name, CompletionItemKind::FILE)
                    .detail(insert.clone())
                    .insert(insert),
            );
        }
    }
    items
}

/// `../` repeated once per directory between the workspace root and the
/// edited document, so inserted header paths resolve from the document's
/// own directory.
fn ascent_prefix(document_path: &str, root: &str) -> String {
    let relative = document_path.strip_prefix(root).unwrap_or(document_path);
    let depth = relative.split('/').count().saturating_sub(2);
    "../".repeat(depth)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Scan a C source for quoted-include problems: an empty inclusion and a
/// repeated inclusion of the same header are both errors. Each diagnostic
/// spans the offending line; angle-bracket includes are left alone.
pub fn validate_includes(text: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut offset = 0;

    for line in text.split('\n') {
        if let Some(spec) = inclusion_spec(line) {
            let anchored = |message: &str| Diagnostic {
                severity: Severity::Error,
                start: offset,
                end: offset + line.len(),
                message: message.to_string(),
                source: DIAGNOSTIC_SOURCE,
            };
            if spec.is_empty() {
                diagnostics.push(anchored(EMPTY_INCLUSION_ERROR));
            } else if seen.contains(&spec) {
                diagnostics.push(anchored(REPEATED_INCLUSION_ERROR));
            } else {
                seen.push(spec);
            }
        }
        offset += line.len() + 1;
    }
    diagnostics
}

/// The quoted header name on an `#include` line. A lone quote counts as
/// an empty inclusion.
fn inclusion_spec(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if !trimmed.starts_with("#include") {
        return None;
    }
    let first = trimmed.find('"')?;
    let last = trimmed.rfind('"')?;
    Some(trimmed.get(first + 1..last).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn c_paths_are_recognised_by_extension() {
        assert!(is_c_path("/work/app/main.c"));
        assert!(is_c_path("include/uk/arch.h"));
        assert!(is_c_path("module.cpp"));
        assert!(!is_c_path("/work/app/Kraftfile"));
        assert!(!is_c_path("main.rs"));
    }

    #[test]
    fn hash_prefix_offers_the_include_directive() {
        let items = complete("#in\n", 0, 3, "/work/app/main.c", None, &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "include");
        assert_eq!(items[0].insert_text, "include ");
        assert_eq!(items[0].kind, CompletionItemKind::SNIPPET);
    }

    #[test]
    fn plain_words_offer_nothing() {
        assert!(complete("int main\n", 0, 2, "/work/app/main.c", None, &[]).is_empty());
    }

    #[test]
    fn quoted_word_on_an_include_line_lists_reachable_headers() {
        let dir = tempdir().unwrap();
        let include = dir.path().join("include");
        fs::create_dir_all(include.join("uk")).unwrap();
        fs::write(include.join("uk").join("arch.h"), "").unwrap();
        let document = format!("{}/src/main.c", dir.path().display());
        let include_paths = vec![include.display().to_string()];

        let text = "#include \"\"\n";
        let items = complete(text, 0, 10, &document, Some(dir.path()), &include_paths);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "arch.h");
        assert_eq!(items[0].kind, CompletionItemKind::FILE);
        // One directory above src/, then the workspace-relative path.
        assert_eq!(items[0].insert_text, "../include/uk/arch.h");
    }

    #[test]
    fn quoted_word_without_a_search_path_offers_nothing() {
        let text = "#include \"\"\n";
        assert!(complete(text, 0, 10, "/work/app/main.c", None, &[]).is_empty());
    }

    #[test]
    fn ascent_matches_the_document_depth() {
        assert_eq!(ascent_prefix("/work/app/main.c", "/work/app"), "");
        assert_eq!(ascent_prefix("/work/app/src/main.c", "/work/app"), "../");
        assert_eq!(
            ascent_prefix("/work/app/src/net/tcp.c", "/work/app"),
            "../../"
        );
    }

    #[test]
    fn empty_inclusion_is_an_error_spanning_its_line() {
        let text = "#include \"\"\n#include <stdio.h>\n";
        let diagnostics = validate_includes(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].message, EMPTY_INCLUSION_ERROR);
        assert_eq!(diagnostics[0].start, 0);
        assert_eq!(diagnostics[0].end, "#include \"\"".len());
    }

    #[test]
    fn repeated_inclusion_flags_the_later_line() {
        let text = "#include \"uk/arch.h\"\n#include \"other.h\"\n#include \"uk/arch.h\"\n";
        let diagnostics = validate_includes(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, REPEATED_INCLUSION_ERROR);
        let third = text.rfind("#include").unwrap();
        assert_eq!(diagnostics[0].start, third);
        assert_eq!(diagnostics[0].end, third + "#include \"uk/arch.h\"".len());
    }

    #[test]
    fn angle_bracket_includes_are_not_checked() {
        let text = "#include <stdio.h>\n#include <stdio.h>\n";
        assert_eq!(validate_includes(text), Vec::new());
    }

    #[test]
    fn a_lone_quote_counts_as_an_empty_inclusion() {
        let diagnostics = validate_includes("#include \"\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, EMPTY_INCLUSION_ERROR);
    }
}
