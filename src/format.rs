use std::fmt;
use std::str::FromStr;

use crate::error::{IndexerError, Result};
use crate::index::KeywordIndex;

/// Output rendering of a [`KeywordIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `keyword: [1, 2, 3]`, one line per keyword.
    #[default]
    Plain,
    /// Pretty-printed JSON object.
    Structured,
}

impl FromStr for OutputFormat {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "txt" => Ok(Self::Plain),
            "structured" | "json" => Ok(Self::Structured),
            _ => Err(IndexerError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Structured => f.write_str("structured"),
        }
    }
}

/// Renders the index. Plain output has no trailing newline.
pub fn format_index(index: &KeywordIndex, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(format_plain(index)),
        OutputFormat::Structured => Ok(serde_json::to_string_pretty(index)?),
    }
}

fn format_plain(index: &KeywordIndex) -> String {
    index
        .iter()
        .map(|(keyword, pages)| {
            let pages = pages
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: [{}]", keyword, pages)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
