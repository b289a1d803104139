//! Per-request state of the synthesis pipeline

use crate::index::Document;

/// Everything produced while answering one query. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct QuerySession {
    pub query: String,
    /// Stage 1 prompt asking for relevant signatures
    pub analysis_prompt: String,
    /// Stage 1 answer from the generator
    pub analysis: String,
    /// Documents stage 1 drew from, in retrieval order
    pub documents: Vec<Document>,
    /// The "Available functions" block embedded in the final prompt
    pub available_functions: String,
    /// Stage 2 prompt
    pub final_prompt: String,
    /// Stage 2 answer, verbatim; `None` until synthesis ran
    pub response: Option<String>,
    /// Called names missing from the available block, when checked
    pub unlisted_calls: Vec<String>,
}

impl QuerySession {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Whether stage 1 surfaced a document for `function` (e.g. `add_cube`)
    pub fn mentions(&self, function: &str) -> bool {
        self.documents.iter().any(|d| d.content().contains(function))
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }
}
