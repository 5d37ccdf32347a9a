//! PDF keyword indexer: extracts technical keywords from every page of a PDF
//! with an LLM and builds a sorted "keyword → pages" index.
//!
//! Pipeline: [`pdf`] → [`keywords`] (cached via [`cache`], backed by [`llm`])
//! → [`index`] → [`format`]. [`orchestrator`] runs it as a background job
//! and reports through [`events`].

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod index;
pub mod keywords;
pub mod llm;
pub mod orchestrator;
pub mod pdf;
pub mod sanitize;
pub mod session;

pub use error::{BackendError, IndexerError};
pub use format::{format_index, OutputFormat};
pub use index::{aggregate, Divider, KeywordIndex};
pub use keywords::KeywordExtractor;
pub use orchestrator::{JobQueue, Orchestrator};
