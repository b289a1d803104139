//! Semantic index over API documentation
//!
//! Key components:
//! - `corpus` - ApiEntry to Document rendering, load-or-build policy
//! - `embeddings` - Local embeddings via fastembed, offline feature hashing
//! - `store` - SQLite-persisted vector index
//! - `retrieval` - MMR search and retrieval-augmented answering

pub mod corpus;
pub mod embeddings;
pub mod retrieval;
pub mod store;

pub use corpus::{load_entries, CorpusBuilder, Document};
pub use embeddings::{Embedder, FastEmbedEngine, HashingEmbedder};
pub use retrieval::{DocumentFilter, KnowledgeIndex, RetrievalAnswer, RetrievalOptions, RetrievalQa};
pub use store::{ScoredDocument, VectorIndex};
