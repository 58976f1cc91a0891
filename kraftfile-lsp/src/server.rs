//! The Kraftfile language server.
//!
//! Thin transport binding over `kraftfile-analysis`: owns the open
//! documents, converts between byte anchors and LSP positions, and
//! publishes diagnostics whenever a manifest is opened, changed or saved.

use std::collections::HashMap;
use std::sync::Arc;

use kraftfile_analysis::completion::{CompletionCandidate, InsertFormat};
use kraftfile_analysis::validate::{Diagnostic as SchemaDiagnostic, Severity};
use kraftfile_analysis::{complete, hover, is_manifest_path, validate, WorkspaceContext};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemLabelDetails, CompletionOptions, CompletionParams,
    CompletionResponse, Diagnostic, DiagnosticSeverity, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams, Hover,
    HoverContents, HoverParams, HoverProviderCapability, InitializeParams, InitializeResult,
    InitializedParams, InsertTextFormat, MarkupContent, MarkupKind, Position, Range,
    ServerCapabilities, ServerInfo, TextDocumentItem, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url,
};
use tower_lsp::Client;
use tracing::debug;

use crate::cheader;

/// Settings accepted via `initializationOptions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    /// Publish schema diagnostics on open/change/save.
    pub diagnostics: bool,
    /// Directories searched for header-file completion in C sources.
    pub include_path: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            diagnostics: true,
            include_path: Vec::new(),
        }
    }
}

#[derive(Default)]
struct DocumentStore {
    entries: RwLock<HashMap<Url, Arc<String>>>,
}

impl DocumentStore {
    async fn upsert(&self, uri: Url, text: String) -> Arc<String> {
        let text = Arc::new(text);
        self.entries.write().await.insert(uri, text.clone());
        text
    }

    async fn get(&self, uri: &Url) -> Option<Arc<String>> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(uri);
    }
}

pub struct KraftfileLanguageServer {
    client: Client,
    documents: DocumentStore,
    workspace: RwLock<WorkspaceContext>,
    settings: RwLock<ServerSettings>,
}

impl KraftfileLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::default(),
            workspace: RwLock::new(WorkspaceContext::default()),
            settings: RwLock::new(ServerSettings::default()),
        }
    }

    async fn store_and_check(&self, uri: Url, text: String) {
        let text = self.documents.upsert(uri.clone(), text).await;
        self.refresh_diagnostics(uri, &text).await;
    }

    async fn refresh_diagnostics(&self, uri: Url, text: &str) {
        if !self.settings.read().await.diagnostics {
            return;
        }
        let schema = if is_manifest_path(uri.path()) {
            validate(text)
        } else if cheader::is_c_path(uri.path()) {
            cheader::validate_includes(text)
        } else {
            return;
        };
        let diagnostics: Vec<Diagnostic> = schema
            .iter()
            .map(|diagnostic| to_lsp_diagnostic(diagnostic, text))
            .collect();
        debug!(uri = %uri, count = diagnostics.len(), "publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

/// Byte offsets of each line start, for offset-to-position conversion.
fn line_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            offsets.push(idx + ch.len_utf8());
        }
    }
    offsets
}

/// Convert a byte offset to an LSP position, clamping past-the-end
/// offsets (the end-of-document anchor) onto the last line.
fn offset_to_position(offset: usize, text: &str, offsets: &[usize]) -> Position {
    let offset = offset.min(text.len());
    let line = offsets.partition_point(|start| *start <= offset) - 1;
    Position::new(line as u32, (offset - offsets[line]) as u32)
}

fn to_lsp_diagnostic(diagnostic: &SchemaDiagnostic, text: &str) -> Diagnostic {
    let offsets = line_offsets(text);
    Diagnostic {
        range: Range {
            start: offset_to_position(diagnostic.start, text, &offsets),
            end: offset_to_position(diagnostic.end, text, &offsets),
        },
        severity: Some(match diagnostic.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        }),
        message: diagnostic.message.clone(),
        source: Some(diagnostic.source.to_string()),
        ..Diagnostic::default()
    }
}

fn to_lsp_completion(candidate: CompletionCandidate) -> CompletionItem {
    CompletionItem {
        label_details: Some(CompletionItemLabelDetails {
            detail: Some(candidate.label_detail),
            description: Some("Unikraft".to_string()),
        }),
        label: candidate.label,
        kind: Some(candidate.kind),
        detail: if candidate.detail.is_empty() {
            None
        } else {
            Some(candidate.detail)
        },
        documentation: Some(lsp_types::Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: candidate.documentation,
        })),
        insert_text: Some(candidate.insert_text),
        insert_text_format: Some(match candidate.insert_format {
            InsertFormat::PlainText => InsertTextFormat::PLAIN_TEXT,
            InsertFormat::Snippet => InsertTextFormat::SNIPPET,
        }),
        sort_text: candidate.sort_text,
        preselect: candidate.preselect.then_some(true),
        ..CompletionItem::default()
    }
}

#[async_trait]
impl tower_lsp::LanguageServer for KraftfileLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options {
            match serde_json::from_value::<ServerSettings>(options) {
                Ok(settings) => *self.settings.write().await = settings,
                Err(err) => debug!(%err, "ignoring malformed initialization options"),
            }
        }
        #[allow(deprecated)]
        if let Some(root) = params.root_uri.as_ref().map(|uri| uri.path()) {
            *self.workspace.write().await = WorkspaceContext::new(root);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions::default()),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "kraftfile-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {}

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let TextDocumentItem { uri, text, .. } = params.text_document;
        debug!(uri = %uri, "document opened");
        self.store_and_check(uri, text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.store_and_check(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(text) = self.documents.get(&params.text_document.uri).await {
            self.refresh_diagnostics(params.text_document.uri, &text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri).await;
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;
        let Some(text) = self.documents.get(&uri).await else {
            return Ok(None);
        };

        let workspace = self.workspace.read().await.clone();
        let candidates = if is_manifest_path(uri.path()) {
            complete(
                &text,
                position.line as usize,
                position.character as usize,
                &workspace,
            )
        } else if cheader::is_c_path(uri.path()) {
            let settings = self.settings.read().await.clone();
            cheader::complete(
                &text,
                position.line as usize,
                position.character as usize,
                uri.path(),
                workspace.root_dir(),
                &settings.include_path,
            )
        } else {
            Vec::new()
        };
        let items: Vec<CompletionItem> = candidates.into_iter().map(to_lsp_completion).collect();

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        let Some(text) = self.documents.get(&uri).await else {
            return Ok(None);
        };

        Ok(
            hover(&text, position.line as usize, position.character as usize).map(|content| {
                Hover {
                    contents: HoverContents::Markup(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value: content.to_markdown(),
                    }),
                    range: None,
                }
            }),
        )
    }
}
