//! Persisted vector index over corpus documents
//!
//! The index lives in a SQLite file: one row per document with its
//! embedding as a blob, plus a small `meta` table recording which embedder
//! produced the vectors.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, warn};

use super::corpus::Document;
use super::embeddings::{blob_to_embedding, cosine_similarity, embedding_to_blob, Embedder};
use super::retrieval::{max_marginal_relevance, RetrievalOptions};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY,
        position INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// A document together with its embedding
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub document: Document,
    pub embedding: Vec<f32>,
}

/// A document returned by a search, with its query similarity
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// In-memory similarity index, immutable once built or loaded
#[derive(Debug, Clone)]
pub struct VectorIndex {
    embedder: String,
    dimensions: usize,
    entries: Vec<IndexedDocument>,
}

impl VectorIndex {
    /// Embed every document and index it in order
    pub async fn build(documents: Vec<Document>, embedder: &dyn Embedder) -> Result<Self> {
        let texts: Vec<String> = documents.iter().map(|d| d.content().to_string()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(anyhow!(
                "Embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            ));
        }

        let entries = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| IndexedDocument {
                document,
                embedding,
            })
            .collect::<Vec<_>>();

        info!(
            "Built index of {} documents with {}",
            entries.len(),
            embedder.name()
        );

        Ok(Self {
            embedder: embedder.name().to_string(),
            dimensions: embedder.dimensions(),
            entries,
        })
    }

    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Load a persisted index. Fails if nothing exists at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open index at {}", path.display()))?;

        let embedder = read_meta(&conn, "embedder")?.unwrap_or_default();
        let dimensions = read_meta(&conn, "dimensions")?
            .and_then(|d| d.parse().ok())
            .unwrap_or(0);

        let mut stmt =
            conn.prepare("SELECT content, embedding FROM documents ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            let content: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((content, blob))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (content, blob) = row?;
            let embedding = blob_to_embedding(&blob)
                .ok_or_else(|| anyhow!("Corrupt embedding blob in {}", path.display()))?;
            entries.push(IndexedDocument {
                document: Document::new(content),
                embedding,
            });
        }

        debug!("Loaded {} documents from {}", entries.len(), path.display());
        Ok(Self {
            embedder,
            dimensions,
            entries,
        })
    }

    /// Persist the index, replacing whatever was stored at `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to create index at {}", path.display()))?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM documents", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (position, content, embedding) VALUES (?1, ?2, ?3)",
            )?;
            for (position, entry) in self.entries.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    entry.document.content(),
                    embedding_to_blob(&entry.embedding)
                ])?;
            }
        }

        let meta = [
            ("embedder", self.embedder.clone()),
            ("dimensions", self.dimensions.to_string()),
            ("created_at", Utc::now().to_rfc3339()),
        ];
        for (key, value) in meta {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;

        info!("Saved index of {} documents to {}", self.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the embedder that produced the stored vectors
    pub fn embedder_name(&self) -> &str {
        &self.embedder
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.document)
    }

    /// Rank documents against a query embedding
    ///
    /// Without diversity the top `k` by cosine similarity are returned. With
    /// diversity the `fetch_k` most similar documents are re-ranked by
    /// maximal marginal relevance and `k` are kept.
    pub fn search(&self, query: &[f32], options: &RetrievalOptions) -> Vec<ScoredDocument> {
        if !self.entries.is_empty() && query.len() != self.dimensions && self.dimensions != 0 {
            warn!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            );
        }

        let mut candidates: Vec<(&IndexedDocument, f32)> = self
            .entries
            .iter()
            .filter(|e| options.accepts(&e.document))
            .map(|e| (e, cosine_similarity(query, &e.embedding)))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        if options.diversify {
            candidates.truncate(options.fetch_k.max(options.k));
            let embeddings: Vec<&[f32]> =
                candidates.iter().map(|(e, _)| e.embedding.as_slice()).collect();
            let picked = max_marginal_relevance(query, &embeddings, options.k, options.lambda_mult);
            picked
                .into_iter()
                .map(|idx| ScoredDocument {
                    document: candidates[idx].0.document.clone(),
                    score: candidates[idx].1,
                })
                .collect()
        } else {
            candidates
                .into_iter()
                .take(options.k)
                .map(|(e, score)| ScoredDocument {
                    document: e.document.clone(),
                    score,
                })
                .collect()
        }
    }
}

fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let result = conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
        row.get::<_, String>(0)
    });
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::embeddings::HashingEmbedder;
    use tempfile::TempDir;

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts.iter().map(|t| Document::new(*t)).collect()
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.db");
        let embedder = HashingEmbedder::new(32);

        let index = VectorIndex::build(docs(&["alpha", "beta", "gamma"]), &embedder)
            .await
            .unwrap();
        index.save(&path).unwrap();
        assert!(VectorIndex::exists(&path));

        let loaded = VectorIndex::load(&path).unwrap();
        let contents: Vec<_> = loaded.documents().map(|d| d.content()).collect();
        assert_eq!(contents, vec!["alpha", "beta", "gamma"]);
        assert_eq!(loaded.embedder_name(), "hashing");
        assert_eq!(loaded.dimensions(), 32);
        assert_eq!(loaded.entries[1].embedding, index.entries[1].embedding);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let embedder = HashingEmbedder::new(16);

        VectorIndex::build(docs(&["one", "two"]), &embedder)
            .await
            .unwrap()
            .save(&path)
            .unwrap();
        VectorIndex::build(docs(&["three"]), &embedder)
            .await
            .unwrap()
            .save(&path)
            .unwrap();

        assert_eq!(VectorIndex::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_index_fails() {
        let dir = TempDir::new().unwrap();
        assert!(VectorIndex::load(&dir.path().join("absent.db")).is_err());
    }

    #[tokio::test]
    async fn test_similarity_search_ranks_best_first() {
        let embedder = HashingEmbedder::default();
        let index = VectorIndex::build(
            docs(&["move the camera", "add a cube", "cube cube cube"]),
            &embedder,
        )
        .await
        .unwrap();

        let query = embedder.embed("cube").await.unwrap();
        let options = RetrievalOptions::default().k(2).diversify(false);
        let results = index.search(&query, &options);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content(), "cube cube cube");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_filter_excludes_documents() {
        let embedder = HashingEmbedder::default();
        let index = VectorIndex::build(docs(&["add a cube", "remove a cube"]), &embedder)
            .await
            .unwrap();

        let query = embedder.embed("cube").await.unwrap();
        let options =
            RetrievalOptions::default().filter(|doc: &Document| doc.content().starts_with("add"));
        let results = index.search(&query, &options);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content(), "add a cube");
    }

    #[tokio::test]
    async fn test_diversified_search_returns_distinct_documents() {
        let embedder = HashingEmbedder::default();
        let texts: Vec<String> = (0..30).map(|i| format!("cube variant {}", i)).collect();
        let documents = texts.iter().map(|t| Document::new(t.as_str())).collect();
        let index = VectorIndex::build(documents, &embedder).await.unwrap();

        let query = embedder.embed("cube").await.unwrap();
        let results = index.search(&query, &RetrievalOptions::default());

        assert_eq!(results.len(), 10);
        let mut contents: Vec<_> = results.iter().map(|r| r.document.content()).collect();
        contents.sort();
        contents.dedup();
        assert_eq!(contents.len(), 10);
    }
}
