//! Language model backends

pub mod generator;
pub mod ollama;

pub use generator::{Generator, TokenSink};
pub use ollama::OllamaGenerator;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::Generator;

    /// Generator answering from a closure and recording every prompt
    pub struct ScriptedGenerator {
        respond: Box<dyn Fn(&str) -> String + Send + Sync>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(respond: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
            Self {
                respond: Box::new(respond),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok((self.respond)(prompt))
        }
    }
}
