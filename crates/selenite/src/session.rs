//
// session.rs
//
// Session coordinator: lifecycle state machine, document synchronization,
// diagnostic publication and the query flows behind every LSP request.
//
// Mutations run under one lock. Queries hold it only to look up the buffer
// and convert the position, then call the project without it.
//

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tower_lsp::lsp_types::{
    CompletionItem, Diagnostic, DocumentHighlight, FileChangeType, Hover, Location, Position,
    Range, SignatureHelp, SymbolInformation, TextDocumentContentChangeEvent, Url, WorkspaceEdit,
};
use tower_lsp::Client;

use crate::config::{self, SessionConfig};
use crate::cursor_context::{
    self, AnnotationKeyword, ChainContext, CursorContext, ModuleCandidates, ModuleReferenceOptions,
};
use crate::diagnostics::{self, DiagnosticEntry, Publish};
use crate::error::{SessionError, SessionResult};
use crate::handlers;
use crate::line_scanner;
use crate::paths::{self, IgnorePatterns};
use crate::perf::{self, TimingGuard};
use crate::position::{self, EditOp};
use crate::project::{ColorGroup, FileAnalysis, FileEvent, FileEventKind, Project, ReferenceMode};
use crate::state::{ServerState, SessionState};
use crate::telemetry::UsageCounters;

// ============================================================================
// Diagnostic sink
// ============================================================================

/// Where diagnostic notifications go.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn publish(&self, path: &str, diagnostics: Vec<Diagnostic>);
}

#[async_trait]
impl DiagnosticSink for Client {
    async fn publish(&self, path: &str, diagnostics: Vec<Diagnostic>) {
        match paths::path_to_uri(path) {
            Some(uri) => self.publish_diagnostics(uri, diagnostics, None).await,
            None => log::warn!("Cannot publish diagnostics for {}: not a valid URI", path),
        }
    }
}

// ============================================================================
// File requests
// ============================================================================

/// A position-based request resolved against the current buffer.
#[derive(Debug, Clone)]
pub struct FileRequest {
    pub path: String,
    /// Snapshot of the buffer; stays valid but goes stale after the next edit
    pub content: Arc<[u8]>,
    pub offset: usize,
    pub position: Position,
}

impl FileRequest {
    /// Byte column of the caret within its line
    fn column(&self) -> usize {
        self.offset - line_scanner::line_start(&self.content, self.offset)
    }
}

/// Log a non-protocol failure and turn it into an empty answer.
fn degrade<T: Default>(operation: &str, result: SessionResult<T>) -> SessionResult<T> {
    match result {
        Err(e) if e.is_protocol_error() => Err(e),
        Err(SessionError::OutOfRange(msg)) => {
            log::warn!("{}: position out of range: {}", operation, msg);
            Ok(T::default())
        }
        Err(e) => {
            log::trace!("{}: {}", operation, e);
            Ok(T::default())
        }
        Ok(value) => Ok(value),
    }
}

/// The chain under the caret; annotations have no chain.
fn chain_at(request: &FileRequest) -> SessionResult<ChainContext> {
    match cursor_context::resolve(&request.content, request.offset)? {
        CursorContext::Chain(chain) => Ok(chain),
        CursorContext::Annotation(_) => Err(SessionError::Invalid),
    }
}

/// Drop entries of disabled kinds and of files whose errors are ignored.
fn filter_entries(
    config: &SessionConfig,
    error_filter: &IgnorePatterns,
    path: &str,
    entries: Vec<DiagnosticEntry>,
) -> Vec<DiagnosticEntry> {
    if error_filter.matches(path) {
        return Vec::new();
    }
    entries
        .into_iter()
        .filter(|entry| config.checks.is_enabled(entry.kind))
        .collect()
}

fn lua_files_under(folders: &[String], config: &SessionConfig) -> Vec<String> {
    let ignore = config.analysis_filter();
    folders
        .iter()
        .flat_map(|folder| {
            paths::collect_lua_files(&PathBuf::from(folder), &config.file_associations, &ignore)
        })
        .collect()
}

// ============================================================================
// Session
// ============================================================================

/// Owns the session state and coordinates it with the project and the
/// diagnostic sink.
pub struct Session {
    state: Mutex<SessionState>,
    project: Arc<dyn Project>,
    sink: Arc<dyn DiagnosticSink>,
    usage: Arc<UsageCounters>,
}

impl Session {
    pub fn new(project: Arc<dyn Project>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            project,
            sink,
            usage: Arc::new(UsageCounters::new()),
        }
    }

    pub fn usage(&self) -> Arc<UsageCounters> {
        self.usage.clone()
    }

    pub async fn server_state(&self) -> ServerState {
        self.state.lock().await.server_state
    }

    pub async fn config(&self) -> SessionConfig {
        self.state.lock().await.config.clone()
    }

    /// What the client currently shows for `path`.
    pub async fn visible_diagnostics(&self, path: &str) -> Vec<DiagnosticEntry> {
        self.state.lock().await.diagnostics.visible(path)
    }

    /// Buffer of an open document.
    pub async fn document(&self, uri: &Url) -> Option<Arc<[u8]>> {
        let path = paths::uri_to_path(uri);
        self.state.lock().await.documents.get(&path)
    }

    async fn emit(&self, publishes: Vec<Publish>) {
        if publishes.is_empty() {
            return;
        }
        let show_provenance = self.project.show_provenance();
        for publish in publishes {
            let diagnostics = publish
                .entries
                .iter()
                .map(|entry| diagnostics::to_lsp_diagnostic(entry, show_provenance))
                .collect();
            log::trace!(
                "Publishing {} diagnostics for {}",
                publish.entries.len(),
                publish.path
            );
            self.sink.publish(&publish.path, diagnostics).await;
        }
    }

    /// Full project analysis, reconciled against what was published.
    async fn reanalyze(&self, state: &mut SessionState) {
        let _guard = TimingGuard::with_threshold("reanalyze_project", 1000);
        let analyzed = self.project.reanalyze_project();
        let filtered: IndexMap<String, Vec<DiagnosticEntry>> = analyzed
            .into_iter()
            .map(|(path, entries)| {
                let entries = filter_entries(&state.config, &state.error_filter, &path, entries);
                (path, entries)
            })
            .filter(|(_, entries)| !entries.is_empty())
            .collect();
        log::info!(
            "Project analysis: {} files, {} with diagnostics",
            self.project.file_count(),
            filtered.len()
        );
        let publishes = state.diagnostics.replace_stable(filtered);
        self.usage.set_file_count(self.project.file_count());
        self.emit(publishes).await;
    }

    /// Walk `folders` and register every Lua file found with the project.
    async fn load_folders(&self, state: &SessionState, folders: Vec<String>) -> bool {
        if folders.is_empty() {
            return false;
        }
        let start = Instant::now();
        let config = state.config.clone();
        let files = tokio::task::spawn_blocking(move || lua_files_under(&folders, &config))
            .await
            .unwrap_or_default();
        perf::record_workspace_scan(start.elapsed(), files.len());
        log::info!("Found {} Lua files in workspace", files.len());

        let events: Vec<FileEvent> = files
            .into_iter()
            .filter(|path| self.project.is_tracked(path))
            .map(|path| FileEvent::new(path, FileEventKind::Created))
            .collect();
        !events.is_empty() && self.project.handle_file_events(&events)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Handle `initialize`: record options and workspace folders.
    pub async fn initialize(
        &self,
        options: Option<&serde_json::Value>,
        folders: Vec<Url>,
    ) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        if state.server_state != ServerState::Created {
            return Err(SessionError::StateViolation(state.server_state));
        }

        let config = options
            .map(config::parse_initialization_options)
            .unwrap_or_default();
        self.project.reconfigure(&config);
        state.apply_config(config);

        state.workspace_folders = folders.iter().map(paths::uri_to_path).collect();
        for folder in &state.workspace_folders {
            log::info!("Adding workspace folder: {}", folder);
        }
        self.usage.set_workspace_folders(state.workspace_folders.len());
        state.server_state = ServerState::Initializing;
        Ok(())
    }

    /// Handle `initialized`: load the workspace and run the first analysis.
    pub async fn initialized(&self) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        if state.server_state != ServerState::Initializing {
            return Err(SessionError::StateViolation(state.server_state));
        }
        state.server_state = ServerState::Initialized;

        let start = Instant::now();
        let folders = state.workspace_folders.clone();
        self.load_folders(&state, folders).await;
        self.reanalyze(&mut state).await;

        let cost = start.elapsed();
        self.usage.set_load_cost(cost);
        perf::record_first_analysis(cost);
        Ok(())
    }

    pub async fn shutdown(&self) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        if state.server_state == ServerState::ShutDown {
            return Err(SessionError::StateViolation(state.server_state));
        }
        log::info!("Shutting down session ({} open documents)", state.documents.len());
        state.documents.log_metrics();
        state.server_state = ServerState::ShutDown;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Document synchronization
    // ------------------------------------------------------------------------

    pub async fn did_open(&self, uri: &Url, text: &str, version: i32) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let path = paths::uri_to_path(uri);
        if !self.project.is_tracked(&path) {
            log::trace!("Ignoring open of untracked file {}", path);
            return Ok(());
        }
        state.documents.open(&path, text, version);
        state.highlight.reset();

        if !self.project.knows_file(&path)
            && self
                .project
                .handle_file_events(&[FileEvent::new(path.clone(), FileEventKind::Created)])
        {
            self.reanalyze(&mut state).await;
        }
        let publishes = state.diagnostics.clear_transient(&path, false);
        self.emit(publishes).await;
        Ok(())
    }

    pub async fn did_change(
        &self,
        uri: &Url,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let path = paths::uri_to_path(uri);
        if !self.project.is_tracked(&path) {
            return Ok(());
        }

        let edits: Vec<EditOp> = changes.into_iter().map(EditOp::from).collect();
        let content = match state.documents.apply_changes(&path, &edits, version) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Dropping change to {} (version {}): {}", path, version, e);
                return Ok(());
            }
        };

        let publishes = match self.project.reanalyze_file(&path, &content) {
            FileAnalysis::Errors(entries) => {
                state.highlight.reset();
                let entries = filter_entries(&state.config, &state.error_filter, &path, entries);
                state.diagnostics.set_transient(&path, entries)
            }
            FileAnalysis::Clean => {
                state.highlight.record_clean_edit(Instant::now());
                state.diagnostics.clear_transient(&path, true)
            }
        };
        self.emit(publishes).await;
        Ok(())
    }

    pub async fn did_save(&self, uri: &Url, text: Option<String>) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let path = paths::uri_to_path(uri);
        if !self.project.is_tracked(&path) {
            return Ok(());
        }
        if let Some(text) = text {
            state.documents.set(&path, text.into_bytes());
        }

        if self
            .project
            .handle_file_events(&[FileEvent::new(path.clone(), FileEventKind::Changed)])
        {
            self.reanalyze(&mut state).await;
        }
        let publishes = state.diagnostics.save_file(&path);
        self.emit(publishes).await;
        Ok(())
    }

    pub async fn did_close(&self, uri: &Url) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let path = paths::uri_to_path(uri);
        if !self.project.is_tracked(&path) {
            return Ok(());
        }
        if let Err(e) = state.documents.close(&path) {
            log::trace!("Close: {}", e);
        }

        let mut publishes = state.diagnostics.clear_transient(&path, false);
        if !paths::within_any(&path, &state.workspace_folders) {
            publishes.extend(state.diagnostics.remove_file(&path));
            self.project
                .handle_file_events(&[FileEvent::new(path.clone(), FileEventKind::Deleted)]);
        }
        self.emit(publishes).await;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Workspace
    // ------------------------------------------------------------------------

    pub async fn did_change_watched_files(
        &self,
        changes: Vec<tower_lsp::lsp_types::FileEvent>,
    ) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let events: Vec<FileEvent> = changes
            .into_iter()
            .filter_map(|change| {
                let path = paths::uri_to_path(&change.uri);
                if !self.project.is_tracked(&path) {
                    return None;
                }
                let kind = match change.typ {
                    FileChangeType::CREATED => FileEventKind::Created,
                    FileChangeType::CHANGED => FileEventKind::Changed,
                    FileChangeType::DELETED => FileEventKind::Deleted,
                    _ => return None,
                };
                Some(FileEvent::new(path, kind))
            })
            .collect();
        if events.is_empty() {
            return Ok(());
        }

        let changed = self.project.handle_file_events(&events);
        let mut publishes = Vec::new();
        for event in &events {
            publishes.extend(state.diagnostics.clear_transient(&event.path, false));
        }
        self.emit(publishes).await;
        if changed {
            self.reanalyze(&mut state).await;
        }
        Ok(())
    }

    pub async fn did_change_workspace_folders(
        &self,
        added: Vec<Url>,
        removed: Vec<Url>,
    ) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let mut events = Vec::new();
        let mut publishes = Vec::new();
        for folder in removed.iter().map(paths::uri_to_path) {
            log::info!("Removing workspace folder: {}", folder);
            state.workspace_folders.retain(|f| *f != folder);
            for file in self.project.known_files() {
                if paths::is_within(&file, &folder)
                    && !paths::within_any(&file, &state.workspace_folders)
                {
                    publishes.extend(state.diagnostics.remove_file(&file));
                    events.push(FileEvent::new(file, FileEventKind::Deleted));
                }
            }
        }
        self.emit(publishes).await;
        if !events.is_empty() {
            self.project.handle_file_events(&events);
        }

        let mut new_folders = Vec::new();
        for folder in added.iter().map(paths::uri_to_path) {
            if paths::within_any(&folder, &state.workspace_folders) {
                log::trace!("Workspace folder {} already covered", folder);
                continue;
            }
            log::info!("Adding workspace folder: {}", folder);
            state.workspace_folders.push(folder.clone());
            new_folders.push(folder);
        }
        self.load_folders(&state, new_folders).await;

        self.usage.set_workspace_folders(state.workspace_folders.len());
        self.reanalyze(&mut state).await;
        Ok(())
    }

    /// Handle `workspace/didChangeConfiguration`.
    ///
    /// The first notification echoes the initialization options and is
    /// only recorded. Later ones reset diagnostics and reanalyze.
    pub async fn did_change_configuration(&self, settings: &serde_json::Value) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        state.server_state.ensure_serving()?;

        let config = config::parse_settings(settings, &state.config);
        if !state.settings_received {
            state.settings_received = true;
            self.project.reconfigure(&config);
            state.apply_config(config);
            log::info!("Recorded base settings");
            return Ok(());
        }
        if config == state.config {
            log::trace!("Configuration unchanged");
            return Ok(());
        }

        log::info!("Configuration changed; reanalyzing project");
        self.project.reconfigure(&config);
        state.apply_config(config);
        let publishes = state.diagnostics.clear_all();
        self.emit(publishes).await;

        let folders = state.workspace_folders.clone();
        self.load_folders(&state, folders).await;
        self.reanalyze(&mut state).await;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Resolve a position request against the open buffer.
    ///
    /// # Errors
    /// `StateViolation` outside the serving state, `NotTracked` for files
    /// outside the project, `CacheMiss` when the document is not open and
    /// `OutOfRange` when the position is not in the buffer.
    pub fn begin_file_request(
        &self,
        state: &mut SessionState,
        uri: &Url,
        position: Position,
    ) -> SessionResult<FileRequest> {
        state.server_state.ensure_serving()?;
        let path = paths::uri_to_path(uri);
        if !self.project.is_tracked(&path) {
            return Err(SessionError::NotTracked(path));
        }
        let content = state
            .documents
            .get(&path)
            .ok_or_else(|| SessionError::CacheMiss(path.clone()))?;
        let offset = position::offset_for(&content, position.line, position.character)?;
        Ok(FileRequest {
            path,
            content,
            offset,
            position,
        })
    }

    /// Begin a request and snapshot the configuration, releasing the lock.
    async fn request(&self, uri: &Url, position: Position) -> SessionResult<(FileRequest, SessionConfig)> {
        self.usage.record_request();
        let mut state = self.state.lock().await;
        let request = self.begin_file_request(&mut state, uri, position)?;
        Ok((request, state.config.clone()))
    }

    fn module_candidates(request: &FileRequest, config: &SessionConfig) -> Option<ModuleCandidates> {
        cursor_context::resolve_open_file_reference(
            &request.content,
            request.offset,
            request.column(),
            ModuleReferenceOptions {
                include_functions: &config.include_functions,
                separator: config.require_path_separator,
            },
        )
    }

    pub async fn goto_definition(&self, uri: &Url, position: Position) -> SessionResult<Vec<Location>> {
        degrade("definition", self.definition_inner(uri, position).await)
    }

    async fn definition_inner(&self, uri: &Url, position: Position) -> SessionResult<Vec<Location>> {
        let (request, config) = self.request(uri, position).await?;

        if let Some(candidates) = Self::module_candidates(&request, &config) {
            let found = self.project.find_module(&request.path, &candidates);
            log::trace!("Module reference {:?} resolved to {:?}", candidates, found);
            return Ok(found
                .and_then(|path| paths::path_to_uri(&path))
                .map(|uri| Location {
                    uri,
                    range: Range::default(),
                })
                .into_iter()
                .collect());
        }

        let context = cursor_context::resolve(&request.content, request.offset)?;
        let found = self.project.find_definitions(&request.path, &context);
        Ok(handlers::locations(&found, usize::MAX))
    }

    pub async fn hover(&self, uri: &Url, position: Position) -> SessionResult<Option<Hover>> {
        degrade("hover", self.hover_inner(uri, position).await)
    }

    async fn hover_inner(&self, uri: &Url, position: Position) -> SessionResult<Option<Hover>> {
        let (request, config) = self.request(uri, position).await?;

        if let Some(candidates) = Self::module_candidates(&request, &config) {
            let shown = self
                .project
                .find_module(&request.path, &candidates)
                .unwrap_or(candidates.primary);
            return Ok(Some(handlers::module_hover(&shown, position)));
        }

        let context = cursor_context::resolve(&request.content, request.offset)?;
        if let CursorContext::Annotation(annotation) = &context {
            if annotation.on_keyword {
                return Ok(AnnotationKeyword::parse(&annotation.word)
                    .map(|keyword| handlers::annotation_hover(keyword, position)));
            }
        }
        Ok(self
            .project
            .hover_text(&request.path, &context)
            .and_then(|text| handlers::symbol_hover(&text, position)))
    }

    pub async fn references(&self, uri: &Url, position: Position) -> SessionResult<Vec<Location>> {
        degrade("references", self.references_inner(uri, position).await)
    }

    async fn references_inner(&self, uri: &Url, position: Position) -> SessionResult<Vec<Location>> {
        let (request, config) = self.request(uri, position).await?;
        let chain = chain_at(&request)?;
        let found = self
            .project
            .find_references(&request.path, &chain, ReferenceMode::Reference);
        if found.len() > config.reference_max_num {
            log::info!(
                "References capped at {} of {}",
                config.reference_max_num,
                found.len()
            );
        }
        Ok(handlers::locations(&found, config.reference_max_num))
    }

    pub async fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> SessionResult<Option<WorkspaceEdit>> {
        degrade("rename", self.rename_inner(uri, position, new_name).await)
    }

    async fn rename_inner(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> SessionResult<Option<WorkspaceEdit>> {
        let (request, _) = self.request(uri, position).await?;
        let chain = chain_at(&request)?;
        let found = self
            .project
            .find_references(&request.path, &chain, ReferenceMode::Rename);
        if found.is_empty() {
            return Ok(None);
        }
        Ok(Some(handlers::rename_edit(&found, new_name)))
    }

    pub async fn document_highlight(
        &self,
        uri: &Url,
        position: Position,
    ) -> SessionResult<Vec<DocumentHighlight>> {
        degrade("highlight", self.highlight_inner(uri, position).await)
    }

    async fn highlight_inner(
        &self,
        uri: &Url,
        position: Position,
    ) -> SessionResult<Vec<DocumentHighlight>> {
        self.usage.record_request();
        let request = {
            let mut state = self.state.lock().await;
            let request = self.begin_file_request(&mut state, uri, position)?;
            if state.highlight.is_quiet(Instant::now()) {
                log::trace!("Highlight suppressed after recent edit");
                return Ok(Vec::new());
            }
            request
        };
        let chain = chain_at(&request)?;
        let found = self
            .project
            .find_references(&request.path, &chain, ReferenceMode::Highlight);
        Ok(handlers::highlights(&found))
    }

    pub async fn completion(&self, uri: &Url, position: Position) -> SessionResult<Vec<CompletionItem>> {
        degrade("completion", self.completion_inner(uri, position).await)
    }

    async fn completion_inner(
        &self,
        uri: &Url,
        position: Position,
    ) -> SessionResult<Vec<CompletionItem>> {
        let (request, _) = self.request(uri, position).await?;
        if cursor_context::at_annotation_marker(&request.content, request.offset) {
            return Ok(handlers::annotation_keyword_items());
        }
        let context = cursor_context::resolve(&request.content, request.offset)?;
        let candidates = self.project.complete(&request.path, &context);
        Ok(handlers::completion_items(&candidates))
    }

    pub async fn completion_resolve(&self, item: CompletionItem) -> SessionResult<CompletionItem> {
        self.state.lock().await.server_state.ensure_serving()?;
        let Some(index) = handlers::completion_index(&item) else {
            return Ok(item);
        };
        match self.project.resolve_completion(index) {
            Some(resolved) => Ok(handlers::resolve_completion_item(item, &resolved)),
            None => Ok(item),
        }
    }

    pub async fn signature_help(
        &self,
        uri: &Url,
        position: Position,
    ) -> SessionResult<Option<SignatureHelp>> {
        degrade("signature help", self.signature_help_inner(uri, position).await)
    }

    async fn signature_help_inner(
        &self,
        uri: &Url,
        position: Position,
    ) -> SessionResult<Option<SignatureHelp>> {
        let (request, _) = self.request(uri, position).await?;
        if !line_scanner::state_at(&request.content, request.offset).is_code() {
            return Err(SessionError::Invalid);
        }
        let callee = cursor_context::resolve_call(&request.content, request.offset)?;
        let active = callee.call_argument.unwrap_or(0);
        let signatures = self.project.signature_help(&request.path, &callee);
        Ok(handlers::signature_help(&signatures, active))
    }

    /// Ranges of globals and annotation names in an open document, grouped
    /// by coloring category.
    pub async fn var_colors(&self, uri: &Url) -> SessionResult<Vec<ColorGroup>> {
        degrade("var color", self.var_colors_inner(uri).await)
    }

    async fn var_colors_inner(&self, uri: &Url) -> SessionResult<Vec<ColorGroup>> {
        let (request, _) = self.request(uri, Position::default()).await?;
        let groups = self.project.var_colors(&request.path);
        log::trace!("{} color groups for {}", groups.len(), request.path);
        Ok(groups)
    }

    pub async fn document_symbols(&self, uri: &Url) -> SessionResult<Vec<SymbolInformation>> {
        self.usage.record_request();
        self.state.lock().await.server_state.ensure_serving()?;
        let path = paths::uri_to_path(uri);
        if !self.project.is_tracked(&path) {
            log::trace!("document symbols: not tracked: {}", path);
            return Ok(Vec::new());
        }
        Ok(handlers::symbol_information(&self.project.document_symbols(&path)))
    }

    pub async fn workspace_symbols(&self, query: &str) -> SessionResult<Vec<SymbolInformation>> {
        self.usage.record_request();
        self.state.lock().await.server_state.ensure_serving()?;
        Ok(handlers::symbol_information(&self.project.workspace_symbols(query)))
    }
}
