use serde::Deserialize;

/// Typed representation of `crystal tool implementations -f json` output.
///
/// The tool prints a single JSON object on stdout:
///
/// ```json
/// { "status": "ok", "implementations": [ { "line": 5, "column": 3, "filename": "/src/foo.cr" } ] }
/// ```
///
/// or `{"status":"blocked"}` when the compiler is busy with another request.
/// Deserializing through serde means any missing or mistyped field is a parse
/// error up front instead of a malformed location reaching the editor.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum ToolResponse {
    Ok { implementations: Vec<RawImplementation> },
    Blocked,
}

/// One entry of the `implementations` array, 1-based as the compiler
/// reports it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawImplementation {
    pub line: u32,
    pub column: u32,
    pub filename: String,
}

pub(crate) fn parse_response(raw: &str) -> Result<ToolResponse, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
#[path = "../../tests/src/implementations/response_tests.rs"]
mod tests;
