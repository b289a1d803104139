//! Retrieval-augmented answering over the vector index

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::corpus::Document;
use super::embeddings::{cosine_similarity, Embedder};
use super::store::VectorIndex;
use crate::ai::Generator;

/// Predicate restricting which documents may be retrieved
pub type DocumentFilter = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

/// Search parameters for one retrieval
#[derive(Clone)]
pub struct RetrievalOptions {
    /// Documents handed to the generator
    pub k: usize,
    /// Candidate pool considered before diversity re-ranking
    pub fetch_k: usize,
    /// Re-rank candidates by maximal marginal relevance
    pub diversify: bool,
    /// 1.0 ranks purely by relevance, 0.0 purely by diversity
    pub lambda_mult: f32,
    pub filter: Option<DocumentFilter>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            k: 10,
            fetch_k: 20,
            diversify: true,
            lambda_mult: 0.5,
            filter: None,
        }
    }
}

impl fmt::Debug for RetrievalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalOptions")
            .field("k", &self.k)
            .field("fetch_k", &self.fetch_k)
            .field("diversify", &self.diversify)
            .field("lambda_mult", &self.lambda_mult)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl RetrievalOptions {
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = fetch_k;
        self
    }

    pub fn diversify(mut self, diversify: bool) -> Self {
        self.diversify = diversify;
        self
    }

    pub fn lambda_mult(mut self, lambda_mult: f32) -> Self {
        self.lambda_mult = lambda_mult;
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Document) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub(crate) fn accepts(&self, document: &Document) -> bool {
        self.filter.as_ref().map_or(true, |f| f(document))
    }
}

/// Greedy maximal marginal relevance selection
///
/// Returns indices into `candidates`, in selection order. Each step picks
/// the candidate maximizing `λ·sim(query, c) − (1−λ)·max sim(c, selected)`.
pub fn max_marginal_relevance(
    query: &[f32],
    candidates: &[&[f32]],
    k: usize,
    lambda_mult: f32,
) -> Vec<usize> {
    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let mut selected: Vec<usize> = Vec::new();
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(candidates[idx], candidates[s]))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda_mult * relevance[idx] - (1.0 - lambda_mult) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    selected
}

/// Answer produced by a retrieval-augmented query
#[derive(Debug, Clone)]
pub struct RetrievalAnswer {
    pub answer: String,
    /// Documents the answer was grounded on, in retrieval order
    pub source_documents: Vec<Document>,
}

/// Similarity index that can answer prompts with retrieved context
#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    async fn query(&self, prompt: &str, options: &RetrievalOptions) -> Result<RetrievalAnswer>;
}

/// "Stuff" question answering: every retrieved document is placed in the
/// prompt ahead of the question
pub struct RetrievalQa {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl RetrievalQa {
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Documents relevant to `prompt`, without generating
    pub async fn retrieve(
        &self,
        prompt: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<Document>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(prompt).await?;
        let results = self.index.search(&query, options);
        debug!("Retrieved {} documents", results.len());
        Ok(results.into_iter().map(|r| r.document).collect())
    }
}

#[async_trait]
impl KnowledgeIndex for RetrievalQa {
    async fn query(&self, prompt: &str, options: &RetrievalOptions) -> Result<RetrievalAnswer> {
        let source_documents = self.retrieve(prompt, options).await?;
        let stuffed = stuff_prompt(&source_documents, prompt);
        let answer = self.generator.complete(&stuffed).await?;
        Ok(RetrievalAnswer {
            answer,
            source_documents,
        })
    }
}

/// Wrap a question with retrieved context
pub fn stuff_prompt(documents: &[Document], question: &str) -> String {
    let context = documents
        .iter()
        .map(|d| d.content())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
         {}\n\nQuestion: {}\nHelpful Answer:",
        context, question
    )
}
