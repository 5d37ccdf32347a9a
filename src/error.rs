use thiserror::Error;

/// Document-level failures of an indexing run.
///
/// Page-level AI failures never show up here: they are absorbed by the
/// keyword extractor as [`BackendError`] and degrade to an empty keyword set.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The PDF is missing, unreadable or not a PDF at all.
    #[error("{0}")]
    Extraction(String),

    #[error("No readable text found in PDF: {0}")]
    NoContent(String),

    #[error("Divider must be a positive integer, got '{0}'")]
    InvalidDivider(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Catch-all for a background run that could not proceed.
    #[error("Job failed: {0}")]
    Job(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexerError>;

/// A failed call to the keyword backend (network, auth, schema compliance).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
