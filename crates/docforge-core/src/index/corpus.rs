//! Corpus documents built from API entries
//!
//! Each entry is flattened into a fixed four-line layout (`Function:`,
//! `Description:`, `Parameters:`, `Returns:`). Prompts downstream refer to
//! these labels, so the layout must not drift.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::embeddings::Embedder;
use super::store::VectorIndex;
use crate::docs::ApiEntry;

/// The unit stored in and retrieved from the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    page_content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            page_content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.page_content
    }
}

/// Renders entries into documents and decides whether the index is reused
pub struct CorpusBuilder;

impl CorpusBuilder {
    /// Flatten one entry into its document text
    pub fn render(entry: &ApiEntry) -> String {
        let parameters =
            serde_json::to_string_pretty(&entry.parameters).unwrap_or_else(|_| "{}".to_string());
        format!(
            "Function: {}\nDescription: {}\nParameters: {}\nReturns: {}",
            entry.qualified_name, entry.description, parameters, entry.return_type
        )
    }

    /// One document per entry, in entry order
    pub fn to_documents(entries: &[ApiEntry]) -> Vec<Document> {
        entries
            .iter()
            .map(|entry| Document::new(Self::render(entry)))
            .collect()
    }

    /// Reuse the index at `path` if one exists, otherwise build and persist it
    ///
    /// An existing index is trusted as-is; `entries` is only called when a
    /// new index has to be built.
    pub async fn load_or_build<F>(
        path: &Path,
        embedder: &dyn Embedder,
        entries: F,
    ) -> Result<VectorIndex>
    where
        F: FnOnce() -> Result<Vec<ApiEntry>>,
    {
        if VectorIndex::exists(path) {
            info!("Loading existing index from {}", path.display());
            let index = VectorIndex::load(path)?;
            if index.embedder_name() != embedder.name() {
                warn!(
                    "Index at {} was built with '{}', querying with '{}'",
                    path.display(),
                    index.embedder_name(),
                    embedder.name()
                );
            }
            return Ok(index);
        }

        Self::rebuild(path, embedder, entries()?).await
    }

    /// Build a fresh index from `entries` and persist it, replacing any existing one
    pub async fn rebuild(
        path: &Path,
        embedder: &dyn Embedder,
        entries: Vec<ApiEntry>,
    ) -> Result<VectorIndex> {
        info!("Creating new index from {} entries", entries.len());
        let index = VectorIndex::build(Self::to_documents(&entries), embedder).await?;
        index.save(path)?;
        Ok(index)
    }
}

/// Read a JSON documentation artifact (an array of entries)
pub fn load_entries(path: &Path) -> Result<Vec<ApiEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse documentation JSON in {}", path.display()))
}
