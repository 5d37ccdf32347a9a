use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cache::{DiskCache, KeywordCache, MemoryCache};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
const CACHE_DIR_NAME: &str = "pdf-keyword-indexer";

/// Runtime settings, read from the environment (and `.env`, loaded by the binary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl Config {
    /// Reads `OLLAMA_URL`, `KEYWORD_MODEL` and `KEYWORD_CACHE_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            ollama_url: non_empty("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: non_empty("KEYWORD_MODEL").unwrap_or(defaults.model),
            cache_dir: non_empty("KEYWORD_CACHE_DIR")
                .map(PathBuf::from)
                .or(defaults.cache_dir),
        }
    }

    /// Disk cache when a cache directory is known, memory-only otherwise.
    pub fn open_cache(&self) -> Result<Arc<dyn KeywordCache>> {
        match &self.cache_dir {
            Some(dir) => {
                let cache = DiskCache::open(dir)
                    .with_context(|| format!("Failed to open keyword cache at {}", dir.display()))?;
                Ok(Arc::new(cache))
            }
            None => Ok(Arc::new(MemoryCache::new())),
        }
    }
}

fn default_cache_dir() -> Option<PathBuf> {
    dirs_next::cache_dir().map(|dir| dir.join(CACHE_DIR_NAME))
}
