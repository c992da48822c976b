use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use tower_lsp::{
    Client,
    lsp_types::{Diagnostic, Url},
};
use tracing::debug;

use crate::problems;

use super::state::CrystalLanguageServer;

/// Per-file diagnostics published from tool output, shared with background
/// publishing tasks.
pub(crate) type DiagnosticsCache = Arc<DashMap<Url, Vec<Diagnostic>>>;

/// Parse raw tool output for compiler errors and publish them as diagnostics.
///
/// The compiler reports errors against whatever file they occurred in, not
/// just the queried document, so problems are grouped per file URI. Files
/// that had diagnostics from a previous run but are clean now get an explicit
/// empty publish so stale squiggles disappear.
pub(crate) async fn publish_tool_problems(
    client: &Client,
    cache: &DiagnosticsCache,
    raw: &str,
    fallback_uri: &Url,
) {
    let parsed = problems::parse_problems(raw);
    debug!(
        "tool output carried {} problem(s) ({} bytes)",
        parsed.len(),
        raw.len()
    );

    let mut grouped: HashMap<Url, Vec<Diagnostic>> = HashMap::new();
    for problem in parsed {
        let uri = match problem.file.as_deref().map(Url::from_file_path) {
            Some(Ok(uri)) => uri,
            // Errors without a usable file attach to the queried document.
            _ => fallback_uri.clone(),
        };
        grouped
            .entry(uri)
            .or_default()
            .push(problem.into_lsp_diagnostic());
    }

    let stale: Vec<Url> = cache
        .iter()
        .map(|entry| entry.key().clone())
        .filter(|uri| !grouped.contains_key(uri))
        .collect();

    for uri in stale {
        cache.remove(&uri);
        client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    for (uri, diagnostics) in grouped {
        cache.insert(uri.clone(), diagnostics.clone());
        client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

impl CrystalLanguageServer {
    /// Fire-and-forget problem reporting from the implementations flow:
    /// publishing must not delay the goto-implementations response.
    pub(crate) fn spawn_publish_tool_problems(&self, raw: String, fallback_uri: Url) {
        let client = self.client.clone();
        let cache = Arc::clone(&self.diagnostics_cache);
        tokio::spawn(async move {
            publish_tool_problems(&client, &cache, &raw, &fallback_uri).await;
        });
    }

    /// Clear any previously published diagnostics for a document.
    pub(crate) async fn clear_diagnostics(&self, uri: &Url) {
        if self.diagnostics_cache.remove(uri).is_none() {
            return;
        }
        self.client
            .publish_diagnostics(uri.clone(), Vec::new(), None)
            .await;
    }
}
