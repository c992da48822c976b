mod document_store;

pub use document_store::DocumentStore;

use tower_lsp::lsp_types::Url;

/// An open text document as last synced from the editor.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub text: String,
    pub version: i32,
}

impl Document {
    pub fn new(uri: Url, text: String, version: i32) -> Self {
        Self { uri, text, version }
    }
}
