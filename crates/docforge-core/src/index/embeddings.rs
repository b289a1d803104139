//! Text embeddings
//!
//! `FastEmbedEngine` runs a local ONNX model via fastembed. `HashingEmbedder`
//! is a deterministic bag-of-words feature hasher that needs no model
//! download, used offline and in tests.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

/// Turns text into fixed-size vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier stored alongside a persisted index
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedder '{}' returned no vector", self.name()))
    }
}

/// Local embeddings via fastembed
pub struct FastEmbedEngine {
    model: Arc<TextEmbedding>,
    name: String,
    dimensions: usize,
}

impl FastEmbedEngine {
    /// Load a model by its short name, e.g. `bge-small-en-v1.5`
    pub fn new(model_name: &str) -> Result<Self> {
        let (model, dimensions) = resolve_model(model_name)
            .ok_or_else(|| anyhow!("Unknown embedding model '{}'", model_name))?;

        info!("Loading embedding model {}", model_name);
        let embedding = TextEmbedding::try_new(
            InitOptions::new(model).with_show_download_progress(false),
        )
        .context("Failed to initialize fastembed model")?;

        Ok(Self {
            model: Arc::new(embedding),
            name: format!("fastembed:{}", model_name),
            dimensions,
        })
    }
}

/// Short model names accepted in configuration
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name {
        "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "bge-large-en-v1.5" => Some((EmbeddingModel::BGELargeENV15, 1024)),
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Some((EmbeddingModel::AllMiniLML12V2, 384)),
        "paraphrase-multilingual-mpnet-base-v2" => {
            Some((EmbeddingModel::ParaphraseMLMpnetBaseV2, 768))
        }
        "nomic-embed-text-v1.5" => Some((EmbeddingModel::NomicEmbedTextV15, 768)),
        _ => None,
    }
}

#[async_trait]
impl Embedder for FastEmbedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts with {}", texts.len(), self.name);

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed(texts, None))
            .await
            .context("Embedding task panicked")?
            .context("fastembed embedding failed")
    }
}

/// Deterministic feature-hashing embedder
///
/// Tokens are lowercase alphanumeric runs, so `add_cube` contributes `add`
/// and `cube`. Vectors are L2-normalized.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Cosine similarity; vectors of different length score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Little-endian f32 blob for SQLite storage
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn blob_to_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
