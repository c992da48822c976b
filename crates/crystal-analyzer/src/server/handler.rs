use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, error, info, warn};

use crate::{
    implementations::{ImplementationsError, ImplementationsRequest, ToolResult, translate},
    progress::ProgressToken,
    project,
    server::{settings::ServerSettings, state::CrystalLanguageServer},
};

use tower_lsp::lsp_types::request::{GotoImplementationParams, GotoImplementationResponse};

const CLIENT_NOTIFICATION_PREFIX: &str = "crystal-analyzer:";

#[tower_lsp::async_trait]
impl LanguageServer for CrystalLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initializing crystal-analyzer...");

        let initial_settings =
            ServerSettings::from_lsp_payload(params.initialization_options.as_ref());
        self.apply_settings(initial_settings).await;

        if let Some(folders) = params.workspace_folders {
            *self.workspace_roots.write().await = folders;
        } else if let Some(root) = params.root_uri {
            *self.workspace_roots.write().await = vec![WorkspaceFolder {
                uri: root,
                name: "root".to_string(),
            }];
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                implementation_provider: Some(ImplementationProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "crystal-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("crystal-analyzer initialized");
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings);
        if merged == current {
            return;
        }

        self.apply_settings(merged).await;
        info!("Applied updated crystal-analyzer settings");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down crystal-analyzer");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;
        let filename = short_name(&uri);
        let settings = self.settings_snapshot().await;

        info!("Opened {filename} (v{version}, {} bytes)", text.len());
        if settings.logging.level.allows_info() {
            let _ = AssertUnwindSafe(self.client.log_message(
                MessageType::INFO,
                prefixed_client_message(format!("Opened {filename}")),
            ))
            .catch_unwind()
            .await;
        }

        self.document_store.open(uri, text, version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full-content sync: the last change event carries the whole text.
        if let Some(change) = params.content_changes.into_iter().next_back() {
            self.document_store.update(uri, change.text, version);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Saved {}", short_name(&params.text_document.uri));
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.document_store.close(&uri);
        self.clear_diagnostics(&uri).await;
    }

    async fn goto_implementation(
        &self,
        params: GotoImplementationParams,
    ) -> Result<Option<GotoImplementationResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let settings = self.settings_snapshot().await;

        if !settings.implementations.enable {
            debug!(
                "implementations are disabled; ignoring request for {}",
                short_name(&uri)
            );
            return Ok(None);
        }

        let Ok(document_path) = uri.to_file_path() else {
            warn!("goto-implementation request for non-file URI: {uri}");
            return Ok(None);
        };

        if let Some(document) = self.document_store.get(&uri) {
            debug!(
                "goto-implementation in {} (v{}) at {}:{}",
                short_name(&uri),
                document.version,
                position.line,
                position.character
            );
        }

        let workspace_root = self.workspace_root().await;
        let main_file = project::resolve_main_file(
            &document_path,
            workspace_root.as_deref(),
            settings.main_file.as_deref(),
        );

        // The compiler wants 1-based coordinates; the editor speaks 0-based.
        let request = ImplementationsRequest {
            file_path: document_path.clone(),
            line: position.line + 1,
            column: position.character + 1,
            main_file,
        };
        let context =
            Self::invocation_context(&settings, &document_path, workspace_root.as_deref());

        let progress = ProgressToken::begin(
            &self.client,
            "Implementations",
            Some(format!(
                "{} tool implementations is working…",
                settings.compiler.path
            )),
        )
        .await;

        let outcome = self
            .implementations
            .find_implementations(&request, &context, settings.implementations.enable)
            .await;

        // Raw output goes to the problems collaborator regardless of how the
        // parse went; it does its own independent pass over it.
        if settings.problems.enable {
            if let Some(raw) = outcome.raw_output.clone() {
                self.spawn_publish_tool_problems(raw, uri.clone());
            }
        }

        match outcome.result {
            Ok(result @ ToolResult::Implementations(_)) => {
                let locations = translate(&result);
                let end_msg = match locations.len() {
                    0 => "No implementations found".to_owned(),
                    1 => "1 implementation".to_owned(),
                    n => format!("{n} implementations"),
                };
                debug!("{end_msg} for {}", short_name(&uri));
                progress.end(Some(end_msg)).await;
                if locations.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(GotoImplementationResponse::Array(locations)))
                }
            }
            Ok(ToolResult::Blocked) => {
                progress.end(Some("Compiler busy".to_owned())).await;
                info!("crystal is taking a moment to check implementations");
                if settings.logging.level.allows_info() {
                    let _ = AssertUnwindSafe(self.client.log_message(
                        MessageType::INFO,
                        prefixed_client_message(
                            "The compiler is busy; try the implementations jump again in a moment.",
                        ),
                    ))
                    .catch_unwind()
                    .await;
                }
                Ok(None)
            }
            Ok(ToolResult::Disabled) => {
                progress.end(None).await;
                Ok(None)
            }
            Err(error @ ImplementationsError::SpawnFailed { .. }) => {
                progress.end(Some("Failed".to_owned())).await;
                error!("{error}");
                self.client
                    .show_message(
                        MessageType::ERROR,
                        prefixed_client_message(format!(
                            "Crystal compiler not found. {error}. Check the crystal-analyzer.compiler.path setting."
                        )),
                    )
                    .await;
                Ok(None)
            }
            Err(ImplementationsError::MalformedOutput { raw, reason }) => {
                progress.end(Some("Failed".to_owned())).await;
                error!("failed to parse implementations output: {reason}; raw output follows\n{raw}");
                self.client
                    .show_message(
                        MessageType::ERROR,
                        prefixed_client_message(
                            "Could not parse the compiler's implementations output. The raw output was kept in the crystal-analyzer log.",
                        ),
                    )
                    .await;
                Ok(None)
            }
        }
    }
}

fn short_name(uri: &Url) -> String {
    uri.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("<unknown>")
        .to_string()
}

fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}
