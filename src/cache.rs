//! Content-addressed store for extracted keyword lists.
//!
//! Entries are keyed by a [`Fingerprint`] of the exact page text and prompt,
//! written once and never expired. Two implementations:
//! [`MemoryCache`] (process lifetime) and [`DiskCache`] (one JSON file per
//! fingerprint, survives restarts).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// SHA-256 over a (text, prompt) pair, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(text: &str, prompt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
        hasher.update(prompt.as_bytes());

        let hex = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyed store shared by every extraction run in the process.
pub trait KeywordCache: Send + Sync {
    fn get(&self, key: &Fingerprint) -> Option<Vec<String>>;
    fn put(&self, key: Fingerprint, keywords: Vec<String>);
}

/// In-memory cache, lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<Fingerprint, Vec<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeywordCache for MemoryCache {
    fn get(&self, key: &Fingerprint) -> Option<Vec<String>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: Fingerprint, keywords: Vec<String>) {
        self.entries.insert(key, keywords);
    }
}

/// File-per-entry cache under a directory.
///
/// Corrupt or unreadable entries are treated as misses; failed writes are
/// logged and dropped.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Opens (and creates if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeywordCache for DiskCache {
    fn get(&self, key: &Fingerprint) -> Option<Vec<String>> {
        let path = self.entry_path(key);
        let raw = fs::read(&path).ok()?;

        match serde_json::from_slice(&raw) {
            Ok(keywords) => Some(keywords),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    fn put(&self, key: Fingerprint, keywords: Vec<String>) {
        let path = self.entry_path(&key);
        let result = serde_json::to_vec(&keywords)
            .context("Failed to encode cache entry")
            .and_then(|bytes| write_atomic(&path, &bytes));

        if let Err(e) = result {
            let error = format!("{:#}", e);
            tracing::warn!(path = %path.display(), %error, "cache write failed");
        }
    }
}

// Concurrent writers on one fingerprint each rename a complete file into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .context("Cache entry path has no parent directory")?;
    let tmp = tempfile::NamedTempFile::new_in(dir).context("Failed to create temp cache file")?;
    fs::write(tmp.path(), bytes).context("Failed to write temp cache file")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to persist cache entry: {}", path.display()))?;
    Ok(())
}
