/// Keyword search engine over the static documentation catalog.
///
/// Scores documents by exact and partial token overlap with the query, filters by
/// audience and category, ranks, truncates and optionally attaches snippets.
/// The engine is built once and is immutable afterwards, so `search` is pure and
/// may be called concurrently from any number of tasks without coordination.
use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::index::{query_tokens, Facets, TermIndex};
use crate::model::{DocumentRecord, SearchOptions, SearchResult};
use crate::snippet::{generate_snippet, SnippetConfig};

pub const EXACT_MATCH_WEIGHT: u32 = 10;
pub const PARTIAL_MATCH_WEIGHT: u32 = 5;
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub exact: u32,
    pub partial: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact: EXACT_MATCH_WEIGHT,
            partial: PARTIAL_MATCH_WEIGHT,
        }
    }
}

/// How an index token other than the query token itself can earn partial credit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartialMatch {
    /// Either token contains the other ("api" also matches "rapid").
    #[default]
    Substring,
    /// Either token is a prefix of the other ("auth" matches "authentication").
    Prefix,
    Off,
}

impl PartialMatch {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "substring" => Some(Self::Substring),
            "prefix" => Some(Self::Prefix),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    fn matches(self, index_term: &str, query_term: &str) -> bool {
        if index_term == query_term {
            return false;
        }
        match self {
            Self::Substring => index_term.contains(query_term) || query_term.contains(index_term),
            Self::Prefix => {
                index_term.starts_with(query_term) || query_term.starts_with(index_term)
            }
            Self::Off => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub weights: ScoringWeights,
    pub partial_match: PartialMatch,
    pub default_max_results: usize,
    pub snippet: SnippetConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            partial_match: PartialMatch::default(),
            default_max_results: DEFAULT_MAX_RESULTS,
            snippet: SnippetConfig::default(),
        }
    }
}

pub struct SearchEngine {
    catalog: Vec<DocumentRecord>,
    positions: HashMap<String, usize>,
    index: TermIndex,
    config: EngineConfig,
    fingerprint: String,
}

/// Running total for one document while a query is scored.
#[derive(Default)]
struct Accumulator {
    score: u32,
    matched_terms: Vec<String>,
}

impl Accumulator {
    fn credit(&mut self, points: u32, term: &str) {
        self.score = self.score.saturating_add(points);
        if !self.matched_terms.iter().any(|t| t == term) {
            self.matched_terms.push(term.to_string());
        }
    }
}

impl SearchEngine {
    /// Validate the catalog and build the term index once.
    pub fn new(catalog: Vec<DocumentRecord>, config: EngineConfig) -> Result<Self, AppError> {
        let index = TermIndex::build(&catalog)?;
        let positions = catalog
            .iter()
            .enumerate()
            .map(|(pos, doc)| (doc.id.clone(), pos))
            .collect();
        let fingerprint = fingerprint(&catalog)?;

        Ok(Self {
            catalog,
            positions,
            index,
            config,
            fingerprint,
        })
    }

    /// Rank documents against `query`.
    ///
    /// A query with no token of two or more characters, `max_results == 0`, or a
    /// filter nothing satisfies all yield an empty list; none of them is an error.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        let max_results = options
            .max_results
            .unwrap_or(self.config.default_max_results);
        let tokens = query_tokens(query);
        if tokens.is_empty() || max_results == 0 {
            return Vec::new();
        }

        // Keyed by catalog position so iteration order never depends on hashing.
        let mut scores: BTreeMap<usize, Accumulator> = BTreeMap::new();
        let weights = self.config.weights;

        for token in &tokens {
            if let Some(ids) = self.index.postings(token) {
                for id in ids {
                    self.credit(&mut scores, id, weights.exact, token);
                }
            }

            for (term, ids) in self.index.terms() {
                if self.config.partial_match.matches(term, token) {
                    for id in ids {
                        self.credit(&mut scores, id, weights.partial, token);
                    }
                }
            }
        }

        let mut ranked: Vec<(usize, Accumulator)> = scores
            .into_iter()
            .filter(|(pos, _)| self.passes_filters(&self.catalog[*pos], options))
            .collect();

        ranked.sort_by(|(pos_a, a), (pos_b, b)| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.matched_terms.len().cmp(&a.matched_terms.len()))
                .then_with(|| {
                    self.catalog[*pos_a]
                        .difficulty
                        .rank()
                        .cmp(&self.catalog[*pos_b].difficulty.rank())
                })
                .then_with(|| pos_a.cmp(pos_b))
        });
        ranked.truncate(max_results);

        ranked
            .into_iter()
            .map(|(pos, acc)| {
                let document = &self.catalog[pos];
                let snippet = options.include_snippets.then(|| {
                    generate_snippet(document, &acc.matched_terms, query, &self.config.snippet)
                });
                SearchResult {
                    document: document.clone(),
                    score: acc.score,
                    matched_terms: acc.matched_terms,
                    snippet,
                }
            })
            .collect()
    }

    fn credit(
        &self,
        scores: &mut BTreeMap<usize, Accumulator>,
        id: &str,
        points: u32,
        term: &str,
    ) {
        if let Some(&pos) = self.positions.get(id) {
            scores.entry(pos).or_default().credit(points, term);
        }
    }

    fn passes_filters(&self, document: &DocumentRecord, options: &SearchOptions) -> bool {
        let audience_ok = options
            .audience
            .as_deref()
            .map_or(true, |a| document.audience.iter().any(|d| d == a));
        let category_ok = options
            .category
            .as_deref()
            .map_or(true, |c| document.category == c);
        audience_ok && category_ok
    }

    /// Case-insensitive lookup by id.
    pub fn document(&self, id: &str) -> Result<&DocumentRecord, AppError> {
        let id = id.trim();
        self.positions
            .get(id)
            .map(|&pos| &self.catalog[pos])
            .or_else(|| self.catalog.iter().find(|d| d.id.eq_ignore_ascii_case(id)))
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Documents whose category equals `category` ignoring ASCII case, easiest first.
    pub fn documents_in_category(&self, category: &str) -> Vec<&DocumentRecord> {
        let category = category.trim();
        let mut docs: Vec<&DocumentRecord> = self
            .catalog
            .iter()
            .filter(|d| d.category.eq_ignore_ascii_case(category))
            .collect();
        docs.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then_with(|| a.id.cmp(&b.id)));
        docs
    }

    pub fn facets(&self) -> &Facets {
        self.index.facets()
    }

    pub fn index(&self) -> &TermIndex {
        &self.index
    }

    pub fn catalog(&self) -> &[DocumentRecord] {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// SHA-256 of the catalog contents; changes whenever any record changes.
    pub fn catalog_fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(catalog: &[DocumentRecord]) -> Result<String, AppError> {
    let canonical = serde_json::to_vec(catalog)?;
    let digest = Sha256::digest(&canonical);
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::model::Difficulty;

    fn doc(
        id: &str,
        title: &str,
        content: &str,
        tags: &[&str],
        difficulty: Difficulty,
    ) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("{id}.html"),
            category: "Developer Guide".to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            audience: vec!["developers".to_string()],
            difficulty,
        }
    }

    fn engine(catalog: Vec<DocumentRecord>) -> SearchEngine {
        SearchEngine::new(catalog, EngineConfig::default()).unwrap()
    }

    fn builtin_engine() -> SearchEngine {
        engine(builtin_catalog().unwrap())
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.document.id.as_str()).collect()
    }

    #[test]
    fn test_single_exact_match_scores_exact_weight() {
        let engine = engine(vec![doc(
            "api",
            "API Reference",
            "API reference documentation interfaces",
            &[],
            Difficulty::Intermediate,
        )]);
        let results = engine.search("api", &SearchOptions::default());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "api");
        assert_eq!(results[0].score, 10);
        assert_eq!(results[0].matched_terms, vec!["api".to_string()]);
        assert!(results[0].snippet.is_some());
    }

    #[test]
    fn test_difficulty_breaks_ties() {
        let engine = engine(vec![
            doc("hard", "Advanced Guide", "deep dive", &["advanced"], Difficulty::Advanced),
            doc("easy", "Beginner Guide", "first steps", &["beginner"], Difficulty::Beginner),
        ]);
        let results = engine.search("guide", &SearchOptions::default());

        assert_eq!(ids(&results), vec!["easy", "hard"]);
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn test_more_matched_terms_break_score_ties() {
        // single: quantum exact (10) + "quantumness"/"quantumnesses" partial (5 + 5) = 20
        // double: quantum exact (10) + storage exact (10) = 20
        let engine = engine(vec![
            doc("single", "Quantum", "quantumness quantumnesses", &[], Difficulty::Beginner),
            doc("double", "Quantum", "storage", &[], Difficulty::Expert),
        ]);
        let results = engine.search("quantum storage", &SearchOptions::default());

        assert_eq!(ids(&results), vec!["double", "single"]);
        assert_eq!(results[0].score, 20);
        assert_eq!(results[1].score, 20);
        assert_eq!(results[0].matched_terms.len(), 2);
        assert_eq!(results[1].matched_terms.len(), 1);
    }

    #[test]
    fn test_empty_and_blank_queries_return_nothing() {
        let engine = builtin_engine();
        let options = SearchOptions::default();
        assert!(engine.search("", &options).is_empty());
        assert!(engine.search("   ", &options).is_empty());
        assert!(engine.search("a b c", &options).is_empty());
    }

    #[test]
    fn test_max_results_zero_returns_nothing() {
        let engine = builtin_engine();
        let options = SearchOptions {
            max_results: Some(0),
            ..SearchOptions::default()
        };
        assert!(engine.search("quantum consensus", &options).is_empty());
    }

    #[test]
    fn test_truncation_is_monotonic() {
        let engine = builtin_engine();
        let unlimited = engine.search(
            "the guide api quantum",
            &SearchOptions {
                max_results: Some(100),
                ..SearchOptions::default()
            },
        );
        assert!(unlimited.len() > 2);

        for k in 0..=unlimited.len() + 1 {
            let options = SearchOptions {
                max_results: Some(k),
                ..SearchOptions::default()
            };
            let results = engine.search("the guide api quantum", &options);
            assert!(results.len() <= k);
            assert_eq!(ids(&results), ids(&unlimited[..k.min(unlimited.len())]));
        }
    }

    #[test]
    fn test_default_max_results_comes_from_config() {
        let config = EngineConfig {
            default_max_results: 2,
            ..EngineConfig::default()
        };
        let engine = SearchEngine::new(builtin_catalog().unwrap(), config).unwrap();
        assert_eq!(engine.search("the", &SearchOptions::default()).len(), 2);
    }

    #[test]
    fn test_unknown_audience_returns_nothing() {
        let engine = builtin_engine();
        assert!(!engine.search("quantum", &SearchOptions::default()).is_empty());

        let options = SearchOptions {
            audience: Some("nonexistent_audience".to_string()),
            ..SearchOptions::default()
        };
        assert!(engine.search("quantum", &options).is_empty());
    }

    #[test]
    fn test_filters_hold_for_every_result() {
        let engine = builtin_engine();
        let by_audience = engine.search(
            "the quantum guide api",
            &SearchOptions {
                audience: Some("developers".to_string()),
                ..SearchOptions::default()
            },
        );
        assert!(!by_audience.is_empty());
        assert!(by_audience
            .iter()
            .all(|r| r.document.audience.iter().any(|a| a == "developers")));

        let by_category = engine.search(
            "the quantum guide api",
            &SearchOptions {
                category: Some("Whitepaper".to_string()),
                ..SearchOptions::default()
            },
        );
        assert!(!by_category.is_empty());
        assert!(by_category.iter().all(|r| r.document.category == "Whitepaper"));
    }

    #[test]
    fn test_exact_match_outranks_partial_only() {
        let engine = engine(vec![
            doc("partial", "Consensuses", "overview", &[], Difficulty::Beginner),
            doc("exact", "Consensus", "overview", &[], Difficulty::Expert),
        ]);
        let results = engine.search("consensus", &SearchOptions::default());
        assert_eq!(ids(&results), vec!["exact", "partial"]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_partial_never_double_counts_the_exact_token() {
        let engine = engine(vec![doc("d", "Storage", "storage", &["storage"], Difficulty::Beginner)]);
        let results = engine.search("storage", &SearchOptions::default());
        assert_eq!(results[0].score, EXACT_MATCH_WEIGHT);
    }

    #[test]
    fn test_query_token_containing_index_token_earns_partial_credit() {
        let engine = engine(vec![doc("d", "Auth", "tokens", &[], Difficulty::Beginner)]);
        let results = engine.search("authentication", &SearchOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, PARTIAL_MATCH_WEIGHT);
        assert_eq!(results[0].matched_terms, vec!["authentication".to_string()]);
    }

    #[test]
    fn test_prefix_mode_rejects_infix_matches() {
        let catalog = vec![doc("d", "Rapid prototyping", "notes", &[], Difficulty::Beginner)];

        let substring = engine(catalog.clone());
        assert_eq!(substring.search("api", &SearchOptions::default()).len(), 1);

        let prefix = SearchEngine::new(
            catalog,
            EngineConfig {
                partial_match: PartialMatch::Prefix,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        assert!(prefix.search("api", &SearchOptions::default()).is_empty());
        assert_eq!(prefix.search("proto", &SearchOptions::default()).len(), 1);
    }

    #[test]
    fn test_weights_are_injected() {
        let config = EngineConfig {
            weights: ScoringWeights {
                exact: 3,
                partial: 1,
            },
            ..EngineConfig::default()
        };
        let engine = SearchEngine::new(
            vec![doc("d", "Guide", "guides", &[], Difficulty::Beginner)],
            config,
        )
        .unwrap();
        let results = engine.search("guide", &SearchOptions::default());
        assert_eq!(results[0].score, 4);
    }

    #[test]
    fn test_huge_weights_saturate_instead_of_overflowing() {
        let config = EngineConfig {
            weights: ScoringWeights {
                exact: u32::MAX,
                partial: 5,
            },
            ..EngineConfig::default()
        };
        let engine = SearchEngine::new(
            vec![doc("d", "Guide", "guides", &[], Difficulty::Beginner)],
            config,
        )
        .unwrap();
        let results = engine.search("guide", &SearchOptions::default());
        assert_eq!(results[0].score, u32::MAX);
    }

    #[test]
    fn test_snippets_can_be_skipped() {
        let engine = builtin_engine();
        let options = SearchOptions {
            include_snippets: false,
            ..SearchOptions::default()
        };
        let results = engine.search("quantum", &options);
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.snippet.is_none()));
    }

    #[test]
    fn test_quantum_consensus_snippet() {
        let engine = builtin_engine();
        let results = engine.search("quantum consensus", &SearchOptions::default());
        assert_eq!(results[0].document.id, "quantum-consensus");

        let snippet = results[0].snippet.as_deref().unwrap();
        assert!(snippet.contains("<mark>quantum</mark>"), "{snippet}");
        assert!(snippet.contains("<mark>consensus</mark>"), "{snippet}");
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_search_is_deterministic() {
        let engine = builtin_engine();
        let options = SearchOptions::default();
        let first = engine.search("the quantum api guide", &options);
        for _ in 0..5 {
            assert_eq!(engine.search("the quantum api guide", &options), first);
        }
    }

    #[test]
    fn test_query_case_and_repetition_do_not_matter() {
        let engine = builtin_engine();
        let options = SearchOptions::default();
        assert_eq!(
            engine.search("QUANTUM", &options),
            engine.search("quantum quantum", &options)
        );
    }

    #[test]
    fn test_document_lookup_is_case_insensitive() {
        let engine = builtin_engine();
        assert_eq!(engine.document("API-Reference").unwrap().id, "api-reference");
        assert!(matches!(engine.document("missing"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_documents_in_category_sorted_by_difficulty() {
        let engine = builtin_engine();
        let docs = engine.documents_in_category("whitepaper");
        assert_eq!(docs.len(), 4);
        assert!(docs.windows(2).all(|w| w[0].difficulty <= w[1].difficulty));
        assert!(engine.documents_in_category("Nope").is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_catalog_contents() {
        let a = builtin_engine();
        let b = builtin_engine();
        assert_eq!(a.catalog_fingerprint(), b.catalog_fingerprint());
        assert_eq!(a.catalog_fingerprint().len(), 64);

        let mut catalog = builtin_catalog().unwrap();
        catalog[0].content.push_str(" revised");
        let c = engine(catalog);
        assert_ne!(a.catalog_fingerprint(), c.catalog_fingerprint());
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchEngine>();
    }
}
