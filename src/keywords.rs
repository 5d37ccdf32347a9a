use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::{Fingerprint, KeywordCache};
use crate::llm::{build_prompt, KeywordBackend};

/// Per-page keyword extraction with a content-addressed cache in front of
/// the AI backend.
#[derive(Clone)]
pub struct KeywordExtractor {
    backend: Arc<dyn KeywordBackend>,
    cache: Arc<dyn KeywordCache>,
}

impl KeywordExtractor {
    pub fn new(backend: Arc<dyn KeywordBackend>, cache: Arc<dyn KeywordCache>) -> Self {
        Self { backend, cache }
    }

    /// Returns the lower-cased, deduplicated keywords of `text`.
    ///
    /// Backend failures are logged and yield an empty set; they are never
    /// cached, so a later run retries the page.
    pub async fn extract_keywords(&self, text: &str, prompt: &str) -> BTreeSet<String> {
        let key = Fingerprint::new(text, prompt);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(fingerprint = %key, count = cached.len(), "keyword cache hit");
            return cached.into_iter().collect();
        }

        tracing::info!(text_length = text.len(), backend = self.backend.name(), "extracting keywords from text");

        let full_prompt = build_prompt(prompt, text);
        let keywords = match self.backend.complete(&full_prompt).await {
            Ok(list) => normalize_keywords(list.keywords),
            Err(e) => {
                tracing::error!(error = %e, text_length = text.len(), "AI keyword extraction failed");
                return BTreeSet::new();
            }
        };

        self.cache.put(key, keywords.iter().cloned().collect());
        keywords
    }
}

/// Lower-cases and trims every keyword, dropping blanks and duplicates.
pub fn normalize_keywords<I>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    raw.into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
