use std::{
    path::PathBuf,
    sync::Arc,
};

use dashmap::DashMap;
use tokio::sync::RwLock;
use tower_lsp::{Client, lsp_types::WorkspaceFolder};

use crate::{
    document::DocumentStore,
    implementations::{ImplementationsProvider, InvocationContext},
    server::{
        diagnostics::DiagnosticsCache,
        settings::{DEFAULT_CONCURRENT_INVOCATIONS, ServerSettings},
    },
};

/// The crystal-analyzer backend that implements the Language Server Protocol.
pub struct CrystalLanguageServer {
    /// The LSP client handle, used to send notifications (diagnostics,
    /// messages, progress) back to the editor.
    pub(crate) client: Client,

    /// Thread-safe store of all open documents.
    pub(crate) document_store: Arc<DocumentStore>,

    /// Runs `crystal tool implementations` behind the admission gate.
    pub(crate) implementations: Arc<ImplementationsProvider>,

    /// Workspace root folders, populated during `initialize`.
    pub(crate) workspace_roots: RwLock<Vec<WorkspaceFolder>>,

    /// Per-file diagnostics published from tool output, kept so they can be
    /// cleared when the next run reports a clean result.
    pub(crate) diagnostics_cache: DiagnosticsCache,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: Arc<RwLock<ServerSettings>>,
}

impl CrystalLanguageServer {
    /// Create a new `CrystalLanguageServer` wired to the given LSP client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            document_store: Arc::new(DocumentStore::new()),
            implementations: Arc::new(ImplementationsProvider::new(DEFAULT_CONCURRENT_INVOCATIONS)),
            workspace_roots: RwLock::new(Vec::new()),
            diagnostics_cache: Arc::new(DashMap::new()),
            settings: Arc::new(RwLock::new(ServerSettings::default())),
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(&self, settings: ServerSettings) {
        self.implementations
            .set_concurrency_limit(settings.implementations.max_concurrent);
        *self.settings.write().await = settings;
    }

    /// First workspace folder as a filesystem path, if the editor gave us one.
    pub(crate) async fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_roots
            .read()
            .await
            .iter()
            .find_map(|folder| folder.uri.to_file_path().ok())
    }

    /// Build the subprocess context for a query on `document_path`.
    pub(crate) fn invocation_context(
        settings: &ServerSettings,
        document_path: &std::path::Path,
        workspace_root: Option<&std::path::Path>,
    ) -> InvocationContext {
        InvocationContext {
            compiler_path: settings.compiler.path.clone(),
            working_dir: crate::project::working_dir(document_path, workspace_root),
            env: settings
                .compiler
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
