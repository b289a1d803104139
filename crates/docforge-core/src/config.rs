//! Configuration loaded from `~/.docforge/config.toml`
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::docs::concept_forge;
use crate::index::RetrievalOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Module scanned when no documentation artifact is given
    pub module: String,
    /// JSON documentation artifact used instead of scanning
    pub docs_path: Option<PathBuf>,
    pub index_path: PathBuf,
    pub generator: GeneratorConfig,
    pub embeddings: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    /// Report calls to functions missing from the available list
    pub validate_whitelist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module: concept_forge::MODULE_NAME.to_string(),
            docs_path: None,
            index_path: Config::config_dir().join("index.db"),
            generator: GeneratorConfig::default(),
            embeddings: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            validate_whitelist: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    /// Stream tokens as they are generated
    pub stream: bool,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            stream: true,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    FastEmbed,
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// fastembed model name
    pub model: String,
    /// Vector size for the hashing backend
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::FastEmbed,
            model: "bge-small-en-v1.5".to_string(),
            dimensions: 384,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub k: usize,
    pub fetch_k: usize,
    pub diversify: bool,
    pub lambda_mult: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let options = RetrievalOptions::default();
        Self {
            k: options.k,
            fetch_k: options.fetch_k,
            diversify: options.diversify,
            lambda_mult: options.lambda_mult,
        }
    }
}

impl Config {
    /// `~/.docforge`, or `./.docforge` when no home directory is known
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docforge")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from an explicit path (which must exist) or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() && !required {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn retrieval_options(&self) -> RetrievalOptions {
        RetrievalOptions::default()
            .k(self.retrieval.k)
            .fetch_k(self.retrieval.fetch_k)
            .diversify(self.retrieval.diversify)
            .lambda_mult(self.retrieval.lambda_mult)
    }
}
