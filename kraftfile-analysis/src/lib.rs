//! Language intelligence for Unikraft Kraftfile manifests.
//!
//! This crate is the editor-agnostic core behind the Kraftfile language
//! server: given a document's raw text and a cursor position it produces
//! completion candidates, hover documentation and schema diagnostics. It
//! performs no I/O and holds no state between calls beyond the immutable
//! schema registry; the transport layer (see `kraftfile-lsp`) owns the
//! documents and feeds the latest text into each entry point.
//!
//! Completion and hover are deliberately text-first: while the user is
//! typing, the manifest is usually not valid YAML, so both engines work
//! from line-oriented heuristics. Validation runs a best-effort
//! `serde_yaml` parse and walks the result instead.

pub mod anchor;
pub mod completion;
pub mod config;
pub mod context;
pub mod hover;
pub mod manifest;
pub mod schema;
pub mod text;
pub mod validate;

pub use completion::{complete, CompletionCandidate, InsertFormat};
pub use config::WorkspaceContext;
pub use context::EditContext;
pub use hover::{hover, HoverContent};
pub use schema::{AttributeSpec, SchemaRegistry};
pub use validate::{validate, Diagnostic, Severity};

/// The file names a Kraftfile may be stored under.
pub const MANIFEST_FILE_NAMES: &[&str] = &[
    "kraft.yaml",
    "kraft.yml",
    "Kraftfile.yml",
    "Kraftfile.yaml",
    "Kraftfile",
];

/// True when `path` (a filesystem path or URI path) names a Kraftfile.
pub fn is_manifest_path(path: &str) -> bool {
    let basename = path.rsplit('/').next().unwrap_or(path);
    MANIFEST_FILE_NAMES.contains(&basename)
}
