//! Language Server Protocol binding for Kraftfile manifests.
//!
//! Built on tower-lsp, following the same shape as the rest of the LSP
//! ecosystem: the server owns the open documents behind an async lock and
//! delegates manifest questions to `kraftfile-analysis`, which is
//! synchronous and stateless. C sources in the same project get a small
//! amount of `#include` help of their own (see [`cheader`]). Document
//! sync is full-text; each change replaces the stored buffer and
//! triggers one validation pass.

pub mod cheader;
pub mod server;

pub use server::{KraftfileLanguageServer, ServerSettings};
