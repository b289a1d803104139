//! docforge core library
//!
//! Extracts structured API documentation from declared modules, indexes it
//! for semantic retrieval, and turns natural-language requests into code
//! that only calls documented functions.
//!
//! - `docs` - signature parsing, module registry, API surface scanning
//! - `index` - corpus documents, embeddings, persisted vector index
//! - `ai` - generator backends
//! - `pipeline` - two-stage retrieval and constrained synthesis
//! - `context` - process-wide ownership of index and generator
//! - `config` - TOML configuration

pub mod ai;
pub mod config;
pub mod context;
pub mod docs;
pub mod index;
pub mod pipeline;

pub use config::Config;
pub use context::AppContext;
pub use docs::{ApiEntry, ApiSurfaceScanner, ModuleCatalog, ScanError, SignatureParser};
pub use index::{CorpusBuilder, Document, KnowledgeIndex, RetrievalOptions, VectorIndex};
pub use pipeline::{QuerySession, RetrievalSynthesisPipeline};
