//! Two-stage retrieval and constrained synthesis
//!
//! Stage 1 asks the generator, with retrieved documentation as context,
//! which function signatures a request needs. The documents it drew from
//! become the "Available functions" block of stage 2, which asks for code
//! that uses only those functions, or the single token `no`.
//!
//! The whitelist is a prompt contract. Generated code is never parsed or
//! executed here; the optional check in `whitelist` only reports.

pub mod prompts;
pub mod session;
pub mod whitelist;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::index::{KnowledgeIndex, RetrievalOptions};

pub use prompts::REFUSAL_TOKEN;
pub use session::QuerySession;
pub use whitelist::find_unlisted_calls;

pub struct RetrievalSynthesisPipeline<'a> {
    index: &'a dyn KnowledgeIndex,
    options: RetrievalOptions,
    check_whitelist: bool,
}

impl<'a> RetrievalSynthesisPipeline<'a> {
    pub fn new(index: &'a dyn KnowledgeIndex) -> Self {
        Self {
            index,
            options: RetrievalOptions::default(),
            check_whitelist: false,
        }
    }

    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_whitelist_check(mut self, enabled: bool) -> Self {
        self.check_whitelist = enabled;
        self
    }

    /// Run both stages for `query`
    pub async fn handle(&self, query: &str) -> Result<QuerySession> {
        let mut session = self.analyze(query).await?;
        self.synthesize(&mut session).await?;
        Ok(session)
    }

    /// Stage 1: discover candidate functions and build the final prompt
    pub async fn analyze(&self, query: &str) -> Result<QuerySession> {
        let mut session = QuerySession::new(query);
        session.analysis_prompt = prompts::analysis_prompt(query);

        info!("Analyzing required functions");
        let analysis = self
            .index
            .query(&session.analysis_prompt, &self.options)
            .await?;
        debug!(
            "Stage 1 drew on {} documents",
            analysis.source_documents.len()
        );

        session.analysis = analysis.answer;
        session.documents = analysis.source_documents;
        session.available_functions = prompts::available_functions(&session.documents);
        session.final_prompt = prompts::final_prompt(query, &session.available_functions);
        Ok(session)
    }

    /// Stage 2: submit the final prompt and record the response verbatim
    pub async fn synthesize(&self, session: &mut QuerySession) -> Result<()> {
        info!("Synthesizing code");
        let result = self.index.query(&session.final_prompt, &self.options).await?;

        if self.check_whitelist {
            session.unlisted_calls =
                find_unlisted_calls(&result.answer, &session.available_functions);
            if !session.unlisted_calls.is_empty() {
                warn!(
                    "Response calls functions outside the available list: {}",
                    session.unlisted_calls.join(", ")
                );
            }
        }

        session.response = Some(result.answer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ai::testing::ScriptedGenerator;
    use crate::docs::{ApiEntry, ParamMap};
    use crate::index::{CorpusBuilder, Embedder, HashingEmbedder, RetrievalQa, VectorIndex};

    fn entry(name: &str, description: &str, params: &[(&str, &str)], returns: &str) -> ApiEntry {
        ApiEntry {
            qualified_name: name.to_string(),
            description: description.to_string(),
            parameters: params
                .iter()
                .map(|&(name, ty)| (name.to_string(), ty.to_string()))
                .collect::<ParamMap>(),
            return_type: returns.to_string(),
        }
    }

    /// Honors the prompt contract: refuses with an empty block, otherwise
    /// calls the first documented function
    fn contract_generator() -> ScriptedGenerator {
        ScriptedGenerator::new(|prompt| {
            if prompt.contains("Available functions are:\n---\n\n---") {
                return REFUSAL_TOKEN.to_string();
            }
            let function = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Function: "))
                .and_then(|f| f.split('.').next_back())
                .unwrap_or("missing");
            format!("```python\nforge.{}()\n```", function)
        })
    }

    async fn qa_over(entries: &[ApiEntry], generator: Arc<ScriptedGenerator>) -> RetrievalQa {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let index = VectorIndex::build(CorpusBuilder::to_documents(entries), embedder.as_ref())
            .await
            .unwrap();
        RetrievalQa::new(index, embedder, generator)
    }

    #[tokio::test]
    async fn test_cube_request_surfaces_add_cube() {
        let entries = vec![
            entry(
                "add_cube",
                "Add a cube to the scene",
                &[("pos", "Vec3"), ("scale", "Vec3")],
                "None",
            ),
            entry("remove_cube", "Remove a cube by id", &[("id", "int")], "bool"),
        ];
        let generator = Arc::new(contract_generator());
        let qa = qa_over(&entries, generator.clone()).await;

        let session = RetrievalSynthesisPipeline::new(&qa)
            .with_whitelist_check(true)
            .handle("create a cube")
            .await
            .unwrap();

        assert!(session.mentions("add_cube"));
        assert!(session.available_functions.contains("add_cube"));
        for line in session.available_functions.lines() {
            if let Some(name) = line.strip_prefix("Function: ") {
                assert!(entries.iter().any(|e| e.qualified_name == name));
            }
        }
        assert!(session.final_prompt.contains("code implementation for: create a cube"));
        assert!(session.is_complete());
        assert!(session.unlisted_calls.is_empty());

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains(&session.analysis_prompt));
        assert!(prompts[1].contains(&session.final_prompt));
    }

    #[tokio::test]
    async fn test_empty_corpus_yields_refusal() {
        let generator = Arc::new(contract_generator());
        let qa = qa_over(&[], generator.clone()).await;

        let session = RetrievalSynthesisPipeline::new(&qa)
            .handle("create a cube")
            .await
            .unwrap();

        assert!(session.documents.is_empty());
        assert_eq!(session.available_functions, "");
        assert_eq!(session.response.as_deref(), Some("no"));
        assert_eq!(generator.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_response_is_returned_verbatim() {
        let entries = vec![entry("A.f", "Does f", &[], "None")];
        let raw = "  Here you go:\n```python\nforge.teleport()\n```\n";
        let generator = Arc::new(ScriptedGenerator::new(move |_| raw.to_string()));
        let qa = qa_over(&entries, generator).await;

        let session = RetrievalSynthesisPipeline::new(&qa)
            .with_whitelist_check(true)
            .handle("teleport")
            .await
            .unwrap();

        assert_eq!(session.response.as_deref(), Some(raw));
        assert_eq!(session.unlisted_calls, vec!["teleport"]);
    }

    #[tokio::test]
    async fn test_analyze_stops_before_synthesis() {
        let entries = vec![entry("A.f", "Does f", &[], "None")];
        let generator = Arc::new(ScriptedGenerator::new(|_| "f() -> None".to_string()));
        let qa = qa_over(&entries, generator.clone()).await;

        let session = RetrievalSynthesisPipeline::new(&qa)
            .with_options(RetrievalOptions::default().k(1))
            .analyze("use f")
            .await
            .unwrap();

        assert_eq!(session.analysis, "f() -> None");
        assert_eq!(session.documents.len(), 1);
        assert!(!session.is_complete());
        assert_eq!(generator.prompts().len(), 1);
    }
}
