//
// backend.rs
//
// LanguageServer implementation: converts LSP params, delegates to the
// session and maps session errors onto JSON-RPC errors
//

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::{self, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::handlers::{self, VarColorAnnotator, VarColorParams};
use crate::project::WorkspaceProject;
use crate::session::Session;
use crate::telemetry::{LogUsageSink, UsageReporter};

/// Convert a session error into a JSON-RPC error carrying its message.
fn rpc_error(error: SessionError) -> jsonrpc::Error {
    let mut rpc = jsonrpc::Error::invalid_request();
    rpc.message = error.to_string().into();
    rpc
}

/// Notifications have no response; failures are only logged.
fn log_notification(method: &str, result: std::result::Result<(), SessionError>) {
    if let Err(e) = result {
        log::warn!("{} ignored: {}", method, e);
    }
}

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
                ..Default::default()
            },
        )),
        definition_provider: Some(OneOf::Left(true)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        references_provider: Some(OneOf::Left(true)),
        rename_provider: Some(OneOf::Left(true)),
        document_highlight_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        workspace_symbol_provider: Some(OneOf::Left(true)),
        color_provider: Some(ColorProviderCapability::Simple(true)),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(true),
            trigger_characters: Some(vec![
                String::from("."),
                String::from(":"),
                String::from("@"),
                String::from("-"),
            ]),
            ..Default::default()
        }),
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec![String::from("("), String::from(",")]),
            ..Default::default()
        }),
        workspace: Some(WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        }),
        ..Default::default()
    }
}

pub struct Backend {
    session: Session,
    reporter: Mutex<Option<UsageReporter>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        let project = Arc::new(WorkspaceProject::new(&SessionConfig::default()));
        Self {
            session: Session::new(project, Arc::new(client)),
            reporter: Mutex::new(None),
        }
    }

    /// Handle the luahelper/getVarColor request
    async fn handle_var_color(&self, params: VarColorParams) -> Result<Vec<VarColorAnnotator>> {
        log::trace!("Received getVarColor for {}", params.uri);
        let groups = self
            .session
            .var_colors(&params.uri)
            .await
            .map_err(rpc_error)?;
        Ok(handlers::var_color_annotators(&params.uri, &groups))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing selenite");

        let folders: Vec<Url> = match params.workspace_folders {
            Some(folders) => folders.into_iter().map(|f| f.uri).collect(),
            #[allow(deprecated)]
            None => params.root_uri.into_iter().collect(),
        };
        self.session
            .initialize(params.initialization_options.as_ref(), folders)
            .await
            .map_err(rpc_error)?;

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: String::from("selenite"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("selenite initialized");
        log_notification("initialized", self.session.initialized().await);

        let config = self.session.config().await;
        if config.enable_report {
            *self.reporter.lock().await = UsageReporter::start(
                self.session.usage(),
                Arc::new(LogUsageSink),
                config.client,
                Duration::from_secs(config.report_interval_secs),
            );
        }
        log::info!("Workspace initialization complete");
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("selenite shutting down");
        if let Some(mut reporter) = self.reporter.lock().await.take() {
            reporter.shutdown();
        }
        self.session.shutdown().await.map_err(rpc_error)
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        log_notification(
            "didOpen",
            self.session.did_open(&doc.uri, &doc.text, doc.version).await,
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let doc = params.text_document;
        log_notification(
            "didChange",
            self.session
                .did_change(&doc.uri, doc.version, params.content_changes)
                .await,
        );
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        log_notification(
            "didSave",
            self.session
                .did_save(&params.text_document.uri, params.text)
                .await,
        );
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        log_notification(
            "didClose",
            self.session.did_close(&params.text_document.uri).await,
        );
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log_notification(
            "didChangeConfiguration",
            self.session.did_change_configuration(&params.settings).await,
        );
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        log_notification(
            "didChangeWatchedFiles",
            self.session.did_change_watched_files(params.changes).await,
        );
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let added = params.event.added.into_iter().map(|f| f.uri).collect();
        let removed = params.event.removed.into_iter().map(|f| f.uri).collect();
        log_notification(
            "didChangeWorkspaceFolders",
            self.session.did_change_workspace_folders(added, removed).await,
        );
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let pos = params.text_document_position_params;
        let found = self
            .session
            .goto_definition(&pos.text_document.uri, pos.position)
            .await
            .map_err(rpc_error)?;
        Ok(Some(GotoDefinitionResponse::Array(found)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let pos = params.text_document_position_params;
        self.session
            .hover(&pos.text_document.uri, pos.position)
            .await
            .map_err(rpc_error)
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let pos = params.text_document_position;
        let found = self
            .session
            .references(&pos.text_document.uri, pos.position)
            .await
            .map_err(rpc_error)?;
        Ok(Some(found))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let pos = params.text_document_position;
        self.session
            .rename(&pos.text_document.uri, pos.position, &params.new_name)
            .await
            .map_err(rpc_error)
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let pos = params.text_document_position_params;
        let found = self
            .session
            .document_highlight(&pos.text_document.uri, pos.position)
            .await
            .map_err(rpc_error)?;
        Ok(Some(found))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let pos = params.text_document_position;
        let items = self
            .session
            .completion(&pos.text_document.uri, pos.position)
            .await
            .map_err(rpc_error)?;
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        self.session
            .completion_resolve(item)
            .await
            .map_err(rpc_error)
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let pos = params.text_document_position_params;
        self.session
            .signature_help(&pos.text_document.uri, pos.position)
            .await
            .map_err(rpc_error)
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let symbols = self
            .session
            .document_symbols(&params.text_document.uri)
            .await
            .map_err(rpc_error)?;
        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }

    async fn document_color(&self, params: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        let groups = self
            .session
            .var_colors(&params.text_document.uri)
            .await
            .map_err(rpc_error)?;
        Ok(handlers::color_information(&groups))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let symbols = self
            .session
            .workspace_symbols(&params.query)
            .await
            .map_err(rpc_error)?;
        Ok(Some(symbols))
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method("luahelper/getVarColor", Backend::handle_var_color)
        .finish();
    Server::new(stdin, stdout, socket)
        .concurrency_level(4)
        .serve(service)
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ServerState;

    #[test]
    fn test_rpc_error_keeps_message() {
        let err = rpc_error(SessionError::StateViolation(ServerState::ShutDown));
        assert_eq!(err.code, jsonrpc::ErrorCode::InvalidRequest);
        assert_eq!(err.message, "request not allowed while the server is shut down");
    }

    #[test]
    fn test_capabilities() {
        let caps = server_capabilities();
        let completion = caps.completion_provider.unwrap();
        assert_eq!(completion.resolve_provider, Some(true));
        assert_eq!(
            completion.trigger_characters.unwrap(),
            vec![".", ":", "@", "-"]
        );
        assert_eq!(
            caps.signature_help_provider.unwrap().trigger_characters.unwrap(),
            vec!["(", ","]
        );
        match caps.text_document_sync {
            Some(TextDocumentSyncCapability::Options(options)) => {
                assert_eq!(options.change, Some(TextDocumentSyncKind::INCREMENTAL));
            }
            other => panic!("unexpected sync capability: {:?}", other),
        }
        assert!(caps.workspace.is_some());
        assert!(matches!(
            caps.color_provider,
            Some(ColorProviderCapability::Simple(true))
        ));
    }

    #[test]
    fn test_var_color_params_from_json() {
        let params: VarColorParams =
            serde_json::from_value(serde_json::json!({ "uri": "file:///w/a.lua" })).unwrap();
        assert_eq!(params.uri.path(), "/w/a.lua");
    }
}
