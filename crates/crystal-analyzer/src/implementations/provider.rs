use tower_lsp::lsp_types::{Location, Position, Range, Url};
use tracing::debug;

use super::{
    gate::AdmissionGate,
    invoker::{
        ImplementationHit, ImplementationsError, ImplementationsRequest, InvocationContext,
        ToolResult, run_tool, tool_args,
    },
    response::{ToolResponse, parse_response},
};

/// Everything one invocation produced.
///
/// `raw_output` is the full buffered stdout whenever the subprocess ran to
/// end-of-stream. It is present even when parsing failed, so the problems
/// collaborator can run its own independent parse over it.
#[derive(Debug)]
pub struct InvocationOutcome {
    pub raw_output: Option<String>,
    pub result: Result<ToolResult, ImplementationsError>,
}

impl InvocationOutcome {
    fn without_output(result: Result<ToolResult, ImplementationsError>) -> Self {
        Self {
            raw_output: None,
            result,
        }
    }
}

/// Runs `crystal tool implementations` behind the admission gate and maps
/// its JSON output to typed results.
#[derive(Debug)]
pub struct ImplementationsProvider {
    gate: AdmissionGate,
}

impl ImplementationsProvider {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            gate: AdmissionGate::new(concurrency_limit),
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn set_concurrency_limit(&self, limit: usize) {
        self.gate.set_limit(limit);
    }

    /// Run one query end to end: admission check, subprocess, JSON parse.
    ///
    /// * feature disabled → `Disabled`, no gate interaction, nothing spawned
    /// * gate full → `Blocked`, nothing spawned
    /// * otherwise the tool runs to completion and its stdout is parsed
    ///
    /// The gate slot is freed once the output stream has been consumed,
    /// before parsing, and also when the spawn itself fails, so a missing
    /// compiler binary cannot permanently eat capacity.
    pub async fn find_implementations(
        &self,
        request: &ImplementationsRequest,
        context: &InvocationContext,
        enabled: bool,
    ) -> InvocationOutcome {
        if !enabled {
            return InvocationOutcome::without_output(Ok(ToolResult::Disabled));
        }

        let Some(permit) = self.gate.try_admit() else {
            debug!(
                "implementations request denied: {} of {} compiler slots busy",
                self.gate.active_count(),
                self.gate.limit()
            );
            return InvocationOutcome::without_output(Ok(ToolResult::Blocked));
        };

        let args = tool_args(request);
        let raw = match run_tool(context, &args).await {
            Ok(raw) => raw,
            Err(error) => {
                // permit drops here: spawn failure must not leak the slot.
                return InvocationOutcome::without_output(Err(error));
            }
        };
        drop(permit);

        let result = match parse_response(&raw) {
            Ok(ToolResponse::Ok { implementations }) => Ok(ToolResult::Implementations(
                implementations
                    .into_iter()
                    .map(|raw| ImplementationHit {
                        file_path: raw.filename,
                        line: raw.line,
                        column: raw.column,
                    })
                    .collect(),
            )),
            Ok(ToolResponse::Blocked) => Ok(ToolResult::Blocked),
            Err(error) => Err(ImplementationsError::MalformedOutput {
                raw: raw.clone(),
                reason: error.to_string(),
            }),
        };

        InvocationOutcome {
            raw_output: Some(raw),
            result,
        }
    }
}

/// Convert a tool result into editor locations.
///
/// The compiler reports 1-based positions; LSP wants 0-based. Order is
/// preserved. `Blocked` and `Disabled` translate to no locations; the
/// caller decides whether a notice is warranted.
pub fn translate(result: &ToolResult) -> Vec<Location> {
    match result {
        ToolResult::Implementations(hits) => hits.iter().filter_map(hit_to_location).collect(),
        ToolResult::Blocked | ToolResult::Disabled => Vec::new(),
    }
}

fn hit_to_location(hit: &ImplementationHit) -> Option<Location> {
    let uri = Url::from_file_path(&hit.file_path).ok()?;
    let position = Position::new(hit.line.saturating_sub(1), hit.column.saturating_sub(1));
    Some(Location::new(uri, Range::new(position, position)))
}

#[cfg(test)]
#[path = "../../tests/src/implementations/provider_tests.rs"]
mod tests;
