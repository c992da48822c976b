//! Parsing of Crystal compiler error output into LSP diagnostics.
//!
//! Whatever `crystal tool implementations` prints is forwarded here
//! untouched. When the compiler fails it emits a JSON array of errors on
//! stdout (because we pass `-f json`); older compilers and some crash paths
//! still produce plain `Error in file.cr:3: ...` text, which a regex
//! fallback covers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

/// `Syntax error in foo.cr:3: unexpected token` and friends.
static PLAIN_ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:Syntax error|Error) in (.+?):(\d+):? (.+)$").unwrap());

/// One compiler error as reported in `-f json` output.
///
/// All location fields are optional: macro expansion and require errors can
/// come without a file or position attached.
#[derive(Debug, Clone, Deserialize)]
pub struct CrystalProblem {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Length of the offending source span, in characters.
    pub size: Option<u32>,
    pub message: String,
}

impl CrystalProblem {
    /// Convert into an LSP `Diagnostic`, 1-based compiler positions becoming
    /// 0-based editor positions. `size` widens the range when present.
    pub fn into_lsp_diagnostic(self) -> Diagnostic {
        let line = self.line.unwrap_or(1).saturating_sub(1);
        let column = self.column.unwrap_or(1).saturating_sub(1);
        let start = Position::new(line, column);
        let end = Position::new(line, column + self.size.unwrap_or(0));
        Diagnostic {
            range: Range::new(start, end),
            severity: Some(DiagnosticSeverity::ERROR),
            code: None,
            code_description: None,
            source: Some("crystal".to_string()),
            message: self.message,
            related_information: None,
            tags: None,
            data: None,
        }
    }
}

/// Extract problems from raw tool output.
///
/// A JSON error array parses structurally; anything else falls back to the
/// line regex. Output that contains no recognizable error (for example the
/// `{"status":"ok",...}` success object) yields an empty list.
pub fn parse_problems(raw: &str) -> Vec<CrystalProblem> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        if let Ok(problems) = serde_json::from_str::<Vec<CrystalProblem>>(trimmed) {
            return problems;
        }
    }
    parse_plain_output(raw)
}

fn parse_plain_output(raw: &str) -> Vec<CrystalProblem> {
    PLAIN_ERROR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let file = caps.get(1)?.as_str().to_string();
            let line: u32 = caps.get(2)?.as_str().parse().ok()?;
            let message = caps.get(3)?.as_str().trim().to_string();
            Some(CrystalProblem {
                file: Some(file),
                line: Some(line),
                column: Some(1),
                size: None,
                message,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src/problems/parser_tests.rs"]
mod tests;
