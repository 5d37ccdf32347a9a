use std::path::Path;

use crate::error::{IndexerError, Result};
use crate::sanitize::{sanitize, truncate_chars};

/// Upper bound on characters kept per page, to bound prompt cost.
pub const MAX_PAGE_CHARS: usize = 5000;

/// Sanitized text of one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based position of the page in the PDF.
    pub number: usize,
    pub text: String,
}

/// Backend that turns a PDF file into raw per-page text, in document order.
pub trait PdfParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Vec<String>>;
}

/// [`PdfParser`] backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractParser;

impl PdfParser for PdfExtractParser {
    fn parse(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path).map_err(|e| {
            IndexerError::Extraction(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            IndexerError::Extraction(format!(
                "Failed to extract text from PDF {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Checks that `path` exists and carries a `.pdf` extension.
pub fn validate_pdf_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(IndexerError::Extraction(format!(
            "File not found: {}",
            path.display()
        )));
    }

    if path
        .extension()
        .map_or(true, |ext| !ext.eq_ignore_ascii_case("pdf"))
    {
        return Err(IndexerError::Extraction(format!(
            "File must be a PDF document: {}",
            path.display()
        )));
    }

    Ok(())
}

/// A parsed document: its full page count plus the pages that carry text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPdf {
    /// Pages in the PDF, blank ones included.
    pub page_count: usize,
    pub pages: Vec<PageText>,
}

/// Parses the PDF and keeps the sanitized text of every page that has any.
///
/// Pages that are blank (before or after sanitizing) are dropped, but the
/// remaining pages keep their original page numbers.
pub fn extract_pdf(parser: &dyn PdfParser, path: &Path) -> Result<ExtractedPdf> {
    validate_pdf_path(path)?;

    let raw_pages = parser.parse(path)?;
    let page_count = raw_pages.len();
    tracing::debug!(path = %path.display(), pages = page_count, "parsed pdf");

    Ok(ExtractedPdf {
        page_count,
        pages: clean_pages(raw_pages),
    })
}

/// [`extract_pdf`] without the page count.
pub fn extract_page_texts(parser: &dyn PdfParser, path: &Path) -> Result<Vec<PageText>> {
    extract_pdf(parser, path).map(|doc| doc.pages)
}

fn clean_pages(raw_pages: Vec<String>) -> Vec<PageText> {
    raw_pages
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }

            let cleaned = sanitize(trimmed);
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return None;
            }

            Some(PageText {
                number: idx + 1,
                text: truncate_chars(cleaned, MAX_PAGE_CHARS).to_string(),
            })
        })
        .collect()
}
