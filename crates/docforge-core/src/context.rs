//! Process-wide application context
//!
//! Built once at startup: owns the embedder, the generator and the loaded
//! index for the life of the process. Pipelines borrow from it.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::ai::{Generator, OllamaGenerator, TokenSink};
use crate::config::{Config, EmbeddingBackend};
use crate::docs::{ApiEntry, ApiSurfaceScanner, ModuleCatalog};
use crate::index::{
    load_entries, CorpusBuilder, Embedder, FastEmbedEngine, HashingEmbedder, RetrievalQa,
    VectorIndex,
};
use crate::pipeline::RetrievalSynthesisPipeline;

pub struct AppContext {
    config: Config,
    knowledge: RetrievalQa,
}

impl AppContext {
    /// Load or build the index and connect the generator
    ///
    /// With `rebuild` set, an existing index is discarded and rebuilt from
    /// the current documentation.
    pub async fn initialize(
        config: Config,
        catalog: &ModuleCatalog,
        token_sink: Option<TokenSink>,
        rebuild: bool,
    ) -> Result<Self> {
        let embedder = build_embedder(&config)?;

        let index = if rebuild {
            let entries = collect_entries(&config, catalog)?;
            CorpusBuilder::rebuild(&config.index_path, embedder.as_ref(), entries).await?
        } else {
            CorpusBuilder::load_or_build(&config.index_path, embedder.as_ref(), || {
                collect_entries(&config, catalog)
            })
            .await?
        };

        let mut generator = OllamaGenerator::new(&config.generator)?;
        if let Some(sink) = token_sink {
            generator = generator.with_token_sink(sink);
        }

        info!(
            "Context ready: {} documents, generator {}",
            index.len(),
            generator.name()
        );
        Ok(Self::from_parts(config, index, embedder, Arc::new(generator)))
    }

    pub fn from_parts(
        config: Config,
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            knowledge: RetrievalQa::new(index, embedder, generator),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn knowledge(&self) -> &RetrievalQa {
        &self.knowledge
    }

    /// Pipeline configured from this context's settings
    pub fn pipeline(&self) -> RetrievalSynthesisPipeline<'_> {
        RetrievalSynthesisPipeline::new(&self.knowledge)
            .with_options(self.config.retrieval_options())
            .with_whitelist_check(self.config.validate_whitelist)
    }
}

pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embeddings.backend {
        EmbeddingBackend::FastEmbed => Arc::new(FastEmbedEngine::new(&config.embeddings.model)?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)),
    };
    Ok(embedder)
}

/// Entries from the configured JSON artifact, or from scanning the module
pub fn collect_entries(config: &Config, catalog: &ModuleCatalog) -> Result<Vec<ApiEntry>> {
    match &config.docs_path {
        Some(path) => load_entries(path),
        None => Ok(ApiSurfaceScanner::new(catalog).scan(&config.module)?),
    }
}
