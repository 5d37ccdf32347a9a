//! Aggregation of per-page keywords into a keyword → pages index.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexerError;

/// Number of original pages collapsed into one indexed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Divider(NonZeroUsize);

impl Divider {
    pub fn new(value: usize) -> Result<Self, IndexerError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| IndexerError::InvalidDivider(value.to_string()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl FromStr for Divider {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| IndexerError::InvalidDivider(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Divider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps an original page number onto its indexed page: `ceil(page / divider)`.
pub fn adjusted_page(page: usize, divider: Option<Divider>) -> usize {
    match divider {
        Some(d) => page.div_ceil(d.get()),
        None => page,
    }
}

/// How many indexed pages `total_pages` original pages collapse into.
pub fn indexed_page_count(total_pages: usize, divider: Option<Divider>) -> usize {
    adjusted_page(total_pages, divider)
}

/// Sorted keyword → ascending, deduplicated page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordIndex(BTreeMap<String, Vec<usize>>);

impl KeywordIndex {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, keyword: &str) -> Option<&[usize]> {
        self.0.get(keyword).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Builds the index from `(original page, keywords)` pairs.
///
/// Input order and repeated occurrences don't matter: keys come out sorted
/// and every page list strictly increasing.
pub fn aggregate<I>(pages: I, divider: Option<Divider>) -> KeywordIndex
where
    I: IntoIterator<Item = (usize, BTreeSet<String>)>,
{
    let occurrences = pages
        .into_iter()
        .flat_map(|(page, keywords)| {
            let adjusted = adjusted_page(page, divider);
            keywords.into_iter().map(move |k| (k, adjusted))
        })
        .fold(
            BTreeMap::<String, BTreeSet<usize>>::new(),
            |mut acc, (keyword, page)| {
                acc.entry(keyword).or_default().insert(page);
                acc
            },
        );

    KeywordIndex(
        occurrences
            .into_iter()
            .map(|(keyword, pages)| (keyword, pages.into_iter().collect()))
            .collect(),
    )
}
