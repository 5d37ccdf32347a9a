use std::future::Future;
use std::pin::Pin;

use rig::client::{CompletionClient, Nothing};
use rig::providers::ollama;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::BackendError;

/// Prompt used when the caller does not supply one.
pub const DEFAULT_PROMPT: &str = "You are a computer science expert and keyword extractor. \
When you are given a text, extract all relevant computer science terms, put them into their \
singular form and return them as a list. Focus on technical terms, concepts, algorithms, \
programming languages, frameworks, tools and other important computer science topics.";

const EXTRACTOR_PREAMBLE: &str = "Extract keywords from the given text. \
Return every relevant technical or domain term in singular form in the `keywords` field.";

/// Fixed output schema of the keyword backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordList {
    /// List of relevant keywords in singular form
    pub keywords: Vec<String>,
}

pub type BackendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<KeywordList, BackendError>> + Send + 'a>>;

/// A structured-output model that returns the keywords found in a prompt.
pub trait KeywordBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Sends the full prompt (instruction + page text) and returns the
    /// model's answer parsed into [`KeywordList`].
    fn complete<'a>(&'a self, prompt: &'a str) -> BackendFuture<'a>;
}

/// Builds the prompt sent to the backend for one page.
pub fn build_prompt(instruction: &str, text: &str) -> String {
    format!("{}\n\nText to analyze:\n{}", instruction, text)
}

/// [`KeywordBackend`] talking to a local Ollama instance through rig's extractor.
pub struct OllamaBackend {
    client: ollama::Client<reqwest::Client>,
    model: String,
}

impl OllamaBackend {
    /// Creates an Ollama client connected to the configured instance.
    pub fn new(ollama_url: &str, model: impl Into<String>) -> anyhow::Result<Self> {
        let client: ollama::Client<reqwest::Client> = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(ollama_url)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create Ollama client: {}", e))?;

        Ok(Self {
            client,
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.ollama_url, config.model.clone())
    }
}

impl KeywordBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BackendFuture<'a> {
        Box::pin(async move {
            let extractor = self
                .client
                .extractor::<KeywordList>(&self.model)
                .preamble(EXTRACTOR_PREAMBLE)
                .build();

            extractor
                .extract(prompt.to_owned())
                .await
                .map_err(|e| BackendError::new(format!("Keyword extraction failed: {}", e)))
        })
    }
}
