//! Text generation backend abstraction

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Receives generated text incrementally as it streams in
pub type TokenSink = Arc<dyn Fn(&str) + Send + Sync>;

/// A language model that completes prompts
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    /// Complete `prompt`, returning the full generated text
    async fn complete(&self, prompt: &str) -> Result<String>;
}
