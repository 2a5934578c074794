/// Inverted term index over the catalog.
///
/// Maps every lower-cased whitespace token (at least two characters) found in a
/// document's title, content or tags to the ids of the documents containing it.
/// Ordered collections keep the structure deterministic: building twice from the
/// same catalog yields equal indexes.
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::validate_catalog;
use crate::error::AppError;
use crate::model::DocumentRecord;

pub const MIN_TOKEN_CHARS: usize = 2;

/// Split on whitespace, lower-case, drop tokens shorter than `MIN_TOKEN_CHARS`.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
}

/// Distinct query tokens in first-seen order.
pub fn query_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in tokenize(query) {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Every distinct category, tag and audience label in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub audiences: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermIndex {
    postings: BTreeMap<String, BTreeSet<String>>,
    facets: Facets,
}

impl TermIndex {
    /// Build the index, failing fast on a malformed catalog.
    pub fn build(catalog: &[DocumentRecord]) -> Result<Self, AppError> {
        validate_catalog(catalog)?;

        let mut index = TermIndex::default();
        for doc in catalog {
            let fields = std::iter::once(doc.title.as_str())
                .chain(std::iter::once(doc.content.as_str()))
                .chain(doc.tags.iter().map(String::as_str));

            for field in fields {
                for token in tokenize(field) {
                    index
                        .postings
                        .entry(token)
                        .or_default()
                        .insert(doc.id.clone());
                }
            }

            index.facets.categories.insert(doc.category.clone());
            index.facets.tags.extend(doc.tags.iter().cloned());
            index.facets.audiences.extend(doc.audience.iter().cloned());
        }

        Ok(index)
    }

    /// Posting set for an exact token.
    pub fn postings(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.postings.get(token)
    }

    /// All `(token, posting set)` pairs in token order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.postings.iter().map(|(t, ids)| (t.as_str(), ids))
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
