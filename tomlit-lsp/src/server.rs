//! The language server: per-document state and LSP wiring.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionOptions, CompletionParams, CompletionResponse,
    Diagnostic, DiagnosticSeverity, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse,
    Documentation, GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverContents,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    Location, MarkupContent, MarkupKind, OneOf, Position, Range, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tower_lsp::jsonrpc::Result;
use tower_lsp::{async_trait, Client, LanguageServer};
use tracing::debug;

use tomlit_analysis::{anchor_violations, resolve_key_path, Document, LanguageService};
use tomlit_parser::{
    parse_document, Position as AstPosition, Range as AstRange, Severity, SyntaxTree,
};
use tomlit_schema::SchemaStore;

use crate::features::completion::{
    completion_context, key_candidates, value_candidates, CompletionCandidate, CompletionContext,
};
use crate::features::document_symbols::{collect_document_symbols, TomlDocumentSymbol};
use crate::features::hover::render_property;

/// Where published diagnostics go. The live client spawns a notification;
/// tests record.
pub trait DiagnosticsSink: Send + Sync + 'static {
    fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>);
}

impl DiagnosticsSink for Client {
    fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        let client = self.clone();
        tokio::spawn(async move {
            client.publish_diagnostics(uri, diagnostics, None).await;
        });
    }
}

struct DocumentState {
    document: Arc<Document>,
    text: Arc<RwLock<Arc<str>>>,
    watcher: JoinHandle<()>,
}

pub struct TomlLanguageServer<S = Client> {
    sink: Arc<S>,
    service: Arc<LanguageService>,
    documents: RwLock<HashMap<Url, DocumentState>>,
    debounce: Duration,
}

impl TomlLanguageServer<Client> {
    pub fn new(client: Client, cache_dir: PathBuf) -> Self {
        let store = Arc::new(SchemaStore::with_http_cache(cache_dir));
        Self::with_sink(
            Arc::new(client),
            Arc::new(LanguageService::new(store)),
            tomlit_analysis::DEFAULT_DEBOUNCE,
        )
    }
}

impl<S: DiagnosticsSink> TomlLanguageServer<S> {
    pub fn with_sink(sink: Arc<S>, service: Arc<LanguageService>, debounce: Duration) -> Self {
        Self {
            sink,
            service,
            documents: RwLock::new(HashMap::new()),
            debounce,
        }
    }

    async fn update_document(&self, uri: Url, new_text: String) {
        let new_text: Arc<str> = Arc::from(new_text);
        let mut documents = self.documents.write().await;
        if let Some(state) = documents.get(&uri) {
            *state.text.write().await = new_text.clone();
            state.document.request_parse(new_text);
            return;
        }
        let document = Document::with_debounce(uri.to_string(), self.debounce);
        let text = Arc::new(RwLock::new(new_text.clone()));
        let watcher = self.spawn_watcher(uri.clone(), document.clone(), text.clone());
        document.request_parse(new_text);
        documents.insert(
            uri,
            DocumentState {
                document,
                text,
                watcher,
            },
        );
    }

    /// Per-document task: on every completed parse, publish the tree's own
    /// diagnostics plus schema violations anchored to spans.
    fn spawn_watcher(
        &self,
        uri: Url,
        document: Arc<Document>,
        text: Arc<RwLock<Arc<str>>>,
    ) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let service = Arc::clone(&self.service);
        let mut events = document.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let Some(tree) = document.tree() else { continue };
                let snapshot = text.read().await.clone();
                let diagnostics = collect_diagnostics(&service, &tree, &snapshot, &uri).await;
                sink.publish(uri.clone(), diagnostics);
            }
        })
    }

    /// Current text plus the newest available tree. Falls back to an inline
    /// parse when the background parse has not committed yet, so explicit
    /// requests never observe an empty document.
    async fn snapshot(&self, uri: &Url) -> Option<(Arc<str>, Arc<SyntaxTree>)> {
        let documents = self.documents.read().await;
        let state = documents.get(uri)?;
        let text = state.text.read().await.clone();
        let tree = match state.document.tree() {
            Some(tree) => tree,
            None => Arc::new(parse_document(&text)),
        };
        Some((text, tree))
    }
}

async fn collect_diagnostics(
    service: &LanguageService,
    tree: &SyntaxTree,
    text: &str,
    uri: &Url,
) -> Vec<Diagnostic> {
    let mut all = tree.diagnostics.clone();
    let violations = service.validate(text, file_name(uri).as_deref()).await;
    all.extend(anchor_violations(tree, &violations));
    all.iter().map(to_lsp_diagnostic).collect()
}

fn file_name(uri: &Url) -> Option<String> {
    match uri.to_file_path() {
        Ok(path) => Some(path.display().to_string()),
        Err(()) => Some(uri.path().to_string()),
    }
}

fn to_lsp_position(position: &AstPosition) -> Position {
    Position::new(position.line as u32, position.column as u32)
}

fn to_lsp_range(range: &AstRange) -> Range {
    Range {
        start: to_lsp_position(&range.start),
        end: to_lsp_position(&range.end),
    }
}

fn to_lsp_diagnostic(diagnostic: &tomlit_parser::Diagnostic) -> Diagnostic {
    Diagnostic {
        range: to_lsp_range(&diagnostic.range),
        severity: Some(match diagnostic.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        }),
        source: Some("tomlit".to_string()),
        message: diagnostic.message.clone(),
        ..Diagnostic::default()
    }
}

fn position_to_offset(text: &str, position: Position) -> usize {
    let mut line = 0u32;
    let mut offset = 0usize;
    for segment in text.split_inclusive('\n') {
        if line == position.line {
            let column = (position.character as usize).min(segment.trim_end_matches('\n').len());
            return offset + column;
        }
        offset += segment.len();
        line += 1;
    }
    text.len()
}

fn to_completion_item(candidate: CompletionCandidate) -> CompletionItem {
    CompletionItem {
        label: candidate.label,
        kind: Some(if candidate.is_table {
            CompletionItemKind::MODULE
        } else {
            CompletionItemKind::FIELD
        }),
        detail: candidate.detail,
        documentation: candidate.documentation.map(Documentation::String),
        ..CompletionItem::default()
    }
}

#[allow(deprecated)]
fn to_document_symbol(symbol: &TomlDocumentSymbol) -> DocumentSymbol {
    DocumentSymbol {
        name: symbol.name.clone(),
        detail: symbol.detail.clone(),
        kind: symbol.kind,
        deprecated: None,
        range: to_lsp_range(&symbol.range),
        selection_range: to_lsp_range(&symbol.selection_range),
        children: if symbol.children.is_empty() {
            None
        } else {
            Some(symbol.children.iter().map(to_document_symbol).collect())
        },
        tags: None,
    }
}

#[async_trait]
impl<S: DiagnosticsSink> LanguageServer for TomlLanguageServer<S> {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(vec![
                    "[".to_string(),
                    ".".to_string(),
                    "=".to_string(),
                    "\"".to_string(),
                ]),
                ..CompletionOptions::default()
            }),
            definition_provider: Some(OneOf::Left(true)),
            document_symbol_provider: Some(OneOf::Left(true)),
            ..ServerCapabilities::default()
        };
        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "tomlit-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        debug!("server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.update_document(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().last() {
            self.update_document(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(state) = self.documents.write().await.remove(&uri) {
            state.watcher.abort();
            self.sink.publish(uri, Vec::new());
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;
        let Some((text, tree)) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&text, position);
        let name = file_name(&uri);
        let candidates = match completion_context(&text, offset, &tree) {
            CompletionContext::TableHeader { partial } => key_candidates(
                self.service
                    .table_completions(&text, name.as_deref(), &partial)
                    .await,
            ),
            CompletionContext::Value { path } => value_candidates(
                self.service
                    .property_info(&text, name.as_deref(), &path)
                    .await,
            ),
            CompletionContext::Key { table_path } => key_candidates(
                self.service
                    .completions(&text, name.as_deref(), &table_path)
                    .await,
            ),
        };
        if candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompletionResponse::Array(
            candidates.into_iter().map(to_completion_item).collect(),
        )))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        let Some((text, tree)) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&text, position);
        let Some(path) = resolve_key_path(&tree, offset) else {
            return Ok(None);
        };
        let Some(info) = self
            .service
            .property_info(&text, file_name(&uri).as_deref(), &path)
            .await
        else {
            return Ok(None);
        };
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: render_property(&info),
            }),
            range: tree.key_range(&path).map(to_lsp_range),
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        let Some((text, tree)) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&text, position);
        let Some(path) = resolve_key_path(&tree, offset) else {
            return Ok(None);
        };
        let Some((schema_path, line)) = self
            .service
            .schema_definition(&text, file_name(&uri).as_deref(), &path)
            .await
        else {
            return Ok(None);
        };
        let Ok(target) = Url::from_file_path(&schema_path) else {
            return Ok(None);
        };
        let position = Position::new(line as u32, 0);
        Ok(Some(GotoDefinitionResponse::Scalar(Location {
            uri: target,
            range: Range::new(position, position),
        })))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some((_, tree)) = self.snapshot(&params.text_document.uri).await else {
            return Ok(None);
        };
        let symbols = collect_document_symbols(&tree);
        Ok(Some(DocumentSymbolResponse::Nested(
            symbols.iter().map(to_document_symbol).collect(),
        )))
    }
}
