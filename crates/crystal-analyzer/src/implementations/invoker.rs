use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    process::Stdio,
};

use tokio::process::Command;
use tracing::debug;

/// A single "find implementations" query, constructed per user action.
///
/// `line` and `column` are 1-based, as the compiler expects them on the
/// command line.
#[derive(Debug, Clone)]
pub struct ImplementationsRequest {
    pub file_path: PathBuf,
    pub line: u32,
    pub column: u32,
    /// The project entry file giving the compiler its analysis scope,
    /// resolved by [`crate::project::resolve_main_file`].
    pub main_file: PathBuf,
}

/// Where and how to run the compiler, supplied by the server's settings.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub compiler_path: String,
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
}

impl InvocationContext {
    pub fn new(compiler_path: impl Into<String>) -> Self {
        Self {
            compiler_path: compiler_path.into(),
            working_dir: None,
            env: Vec::new(),
        }
    }
}

/// Successful outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    /// Implementation sites, in the order the compiler reported them.
    Implementations(Vec<ImplementationHit>),
    /// The compiler (or our own admission gate) is busy. Recoverable.
    Blocked,
    /// The feature is switched off; nothing was run.
    Disabled,
}

/// One source location returned by the compiler, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationHit {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub enum ImplementationsError {
    /// The compiler binary could not be started at all.
    SpawnFailed { compiler: String, reason: String },
    /// The tool ran but its stdout was not the expected JSON shape.
    /// `raw` keeps the full output for debugging.
    MalformedOutput { raw: String, reason: String },
}

impl Display for ImplementationsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SpawnFailed { compiler, reason } => {
                write!(f, "failed to launch {compiler}: {reason}")
            }
            Self::MalformedOutput { reason, .. } => {
                write!(f, "could not parse compiler output: {reason}")
            }
        }
    }
}

impl std::error::Error for ImplementationsError {}

/// Build the exact argument vector for `crystal tool implementations`.
///
/// The cursor is passed as `-c <file>:<line>:<col>` and the main file gives
/// the compiler its entry point. `--error-trace -f json` makes failures show
/// up as parseable output instead of truncated text.
pub fn tool_args(request: &ImplementationsRequest) -> Vec<String> {
    vec![
        "tool".to_string(),
        "implementations".to_string(),
        "-c".to_string(),
        format!(
            "{}:{}:{}",
            request.file_path.display(),
            request.line,
            request.column
        ),
        request.main_file.display().to_string(),
        "--no-color".to_string(),
        "--error-trace".to_string(),
        "-f".to_string(),
        "json".to_string(),
    ]
}

fn crystal_command(context: &InvocationContext, args: &[String]) -> Command {
    let mut command = Command::new(&context.compiler_path);
    command.kill_on_drop(true).args(args).stdin(Stdio::null());
    if let Some(dir) = &context.working_dir {
        command.current_dir(dir);
    }
    command.envs(context.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    command
}

/// Spawn the compiler and buffer its stdout to end-of-stream.
///
/// Chunk order is whatever the OS pipe delivers; no reordering happens here.
pub(crate) async fn run_tool(
    context: &InvocationContext,
    args: &[String],
) -> Result<String, ImplementationsError> {
    debug!("Running: {} {}", context.compiler_path, args.join(" "));

    let mut command = crystal_command(context, args);
    let output = command
        .output()
        .await
        .map_err(|error| ImplementationsError::SpawnFailed {
            compiler: context.compiler_path.clone(),
            reason: error.to_string(),
        })?;

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
#[path = "../../tests/src/implementations/invoker_tests.rs"]
mod tests;
