//! Ollama generate API client
//!
//! Calls `POST {base_url}/api/generate`. With streaming enabled the
//! response is newline-delimited JSON; each chunk's `response` field is
//! forwarded to the token sink as it arrives.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info};

use super::generator::{Generator, TokenSink};
use crate::config::GeneratorConfig;

/// One line of the generate response
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    stream: bool,
    sink: Option<TokenSink>,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            stream: config.stream,
            sink: None,
        })
    }

    /// Forward streamed text to `sink` while generating
    pub fn with_token_sink(mut self, sink: TokenSink) -> Self {
        self.sink = Some(sink);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": stream,
        });

        debug!("Ollama generate call to model: {}", self.model);
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama API error {}: {}", status, error_text));
        }
        Ok(response)
    }

    async fn complete_blocking(&self, prompt: &str) -> Result<String> {
        let response = self.send(prompt, false).await?;
        let chunk: GenerateChunk = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;
        if let Some(error) = chunk.error {
            return Err(anyhow!("Ollama error: {}", error));
        }
        if let Some(sink) = &self.sink {
            sink(&chunk.response);
        }
        Ok(chunk.response)
    }

    async fn complete_streaming(&self, prompt: &str) -> Result<String> {
        let response = self.send(prompt, true).await?;
        let mut stream = response.bytes_stream();
        let mut decoder = LineDecoder::default();
        let mut text = String::new();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Ollama stream interrupted")?;
            for line in decoder.push(&chunk) {
                if self.handle_line(&line, &mut text)? {
                    break 'outer;
                }
            }
        }
        if let Some(line) = decoder.finish() {
            self.handle_line(&line, &mut text)?;
        }

        info!("Ollama stream complete: {} chars", text.len());
        Ok(text)
    }

    /// Returns true once the final chunk has been seen
    fn handle_line(&self, line: &str, text: &mut String) -> Result<bool> {
        let Some(chunk) = parse_chunk(line)? else {
            return Ok(false);
        };
        if let Some(error) = chunk.error {
            return Err(anyhow!("Ollama error: {}", error));
        }
        if !chunk.response.is_empty() {
            if let Some(sink) = &self.sink {
                sink(&chunk.response);
            }
            text.push_str(&chunk.response);
        }
        Ok(chunk.done)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.stream {
            self.complete_streaming(prompt).await
        } else {
            self.complete_blocking(prompt).await
        }
    }
}

fn parse_chunk(line: &str) -> Result<Option<GenerateChunk>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .with_context(|| format!("Malformed Ollama stream line: {}", line))
}

/// Splits a byte stream into complete lines, holding partial lines back
#[derive(Default)]
struct LineDecoder {
    partial: Vec<u8>,
}

impl LineDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.partial);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn generator() -> OllamaGenerator {
        OllamaGenerator::new(&GeneratorConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..GeneratorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(generator().endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_line_decoder_holds_partial_lines() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.push(b"{\"response\":\"he").is_empty());
        let lines = decoder.push(b"llo\"}\n{\"response\":\"!\"}\n{\"do");
        assert_eq!(lines, vec![r#"{"response":"hello"}"#, r#"{"response":"!"}"#]);
        assert_eq!(decoder.finish().as_deref(), Some(r#"{"do"#));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_handle_line_accumulates_and_streams() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let generator = generator().with_token_sink(Arc::new(move |token: &str| {
            sink_seen.lock().unwrap().push(token.to_string());
        }));

        let mut text = String::new();
        assert!(!generator
            .handle_line(r#"{"response":"```python","done":false}"#, &mut text)
            .unwrap());
        assert!(!generator.handle_line("   ", &mut text).unwrap());
        assert!(generator
            .handle_line(r#"{"response":"","done":true}"#, &mut text)
            .unwrap());

        assert_eq!(text, "```python");
        assert_eq!(*seen.lock().unwrap(), vec!["```python".to_string()]);
    }

    #[test]
    fn test_handle_line_reports_errors() {
        let mut text = String::new();
        let err = generator()
            .handle_line(r#"{"error":"model 'llama3.2' not found"}"#, &mut text)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(generator().handle_line("not json", &mut text).is_err());
    }
}
