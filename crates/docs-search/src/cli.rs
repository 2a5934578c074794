use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::index::Facets;
use crate::model::{Difficulty, SearchOptions, SearchResult};
use crate::session::SessionUpdate;

#[derive(Parser)]
#[command(
    name = "docs-search",
    about = "Keyword search over the documentation catalog",
    version
)]
pub struct Cli {
    /// JSON catalog to search instead of the builtin one (overrides DOCS_CATALOG_PATH)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single query and print the ranked results
    Search {
        /// Free-text query, e.g. "quantum consensus"
        query: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Omit highlighted snippets
        #[arg(long)]
        no_snippets: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories, tags, audiences and difficulty levels
    Facets {
        /// Print facets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read query edits from stdin, one per line, and search as they settle
    Interactive {
        #[command(flatten)]
        filters: FilterArgs,

        /// File holding recent searches, loaded at start and saved on exit
        #[arg(long)]
        history: Option<PathBuf>,

        /// Quiet period before an edit is searched (overrides DOCS_SEARCH_DEBOUNCE_MS)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },

    /// Serve the search as MCP tools over stdio (or TCP with MCP_TCP_LISTEN_ADDR)
    Serve,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only documents written for this audience, e.g. "developers"
    #[arg(long)]
    pub audience: Option<String>,

    /// Only documents in this category, e.g. "Whitepaper"
    #[arg(long)]
    pub category: Option<String>,

    /// Maximum number of results
    #[arg(long = "max")]
    pub max_results: Option<usize>,
}

impl FilterArgs {
    pub fn to_options(&self, include_snippets: bool) -> SearchOptions {
        SearchOptions {
            audience: self.audience.clone(),
            category: self.category.clone(),
            max_results: self.max_results,
            include_snippets,
        }
    }
}

/// Markers used when snippets are printed to a terminal instead of HTML.
pub const TEXT_OPEN_MARKER: &str = "**";
pub const TEXT_CLOSE_MARKER: &str = "**";

pub fn render_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for \"{query}\". Try fewer or broader keywords.\n");
    }

    let mut out = String::new();
    let noun = if results.len() == 1 { "result" } else { "results" };
    let _ = writeln!(out, "{} {noun} for \"{query}\"", results.len());
    for (rank, result) in results.iter().enumerate() {
        let doc = &result.document;
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}. {} [{} / {}] score {}",
            rank + 1,
            doc.title,
            doc.category,
            doc.difficulty,
            result.score
        );
        let _ = writeln!(out, "   {}", doc.url);
        let _ = writeln!(out, "   matched: {}", result.matched_terms.join(", "));
        if let Some(snippet) = &result.snippet {
            let _ = writeln!(out, "   {snippet}");
        }
    }
    out
}

pub fn render_facets(facets: &Facets) -> String {
    let join = |set: &std::collections::BTreeSet<String>| {
        set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };
    let difficulties: Vec<&str> = Difficulty::ALL.iter().map(|d| d.as_str()).collect();

    let mut out = String::new();
    let _ = writeln!(out, "categories:   {}", join(&facets.categories));
    let _ = writeln!(out, "audiences:    {}", join(&facets.audiences));
    let _ = writeln!(out, "tags:         {}", join(&facets.tags));
    let _ = writeln!(out, "difficulties: {}", difficulties.join(", "));
    out
}

pub fn render_update(update: &SessionUpdate) -> String {
    match update {
        SessionUpdate::Loading { query } => format!("searching \"{query}\"...\n"),
        SessionUpdate::Results { query, results } => render_results(query, results),
        SessionUpdate::Cleared => "(query cleared)\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentRecord;

    fn result(score: u32, snippet: Option<&str>) -> SearchResult {
        SearchResult {
            document: DocumentRecord {
                id: "api-reference".to_string(),
                title: "API Reference".to_string(),
                url: "reference/api.html".to_string(),
                category: "Reference".to_string(),
                content: "API reference documentation".to_string(),
                tags: vec![],
                audience: vec!["developers".to_string()],
                difficulty: Difficulty::Intermediate,
            },
            score,
            matched_terms: vec!["api".to_string()],
            snippet: snippet.map(str::to_string),
        }
    }

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from([
            "docs-search",
            "search",
            "quantum consensus",
            "--audience",
            "developers",
            "--max",
            "3",
            "--json",
            "--catalog",
            "docs.json",
        ])
        .unwrap();

        assert_eq!(cli.catalog, Some(PathBuf::from("docs.json")));
        match cli.command {
            Commands::Search {
                query,
                filters,
                no_snippets,
                json,
            } => {
                assert_eq!(query, "quantum consensus");
                assert!(json);
                assert!(!no_snippets);
                let options = filters.to_options(!no_snippets);
                assert_eq!(options.audience.as_deref(), Some("developers"));
                assert_eq!(options.category, None);
                assert_eq!(options.max_results, Some(3));
                assert!(options.include_snippets);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn rejects_non_numeric_max() {
        assert!(Cli::try_parse_from(["docs-search", "search", "api", "--max", "many"]).is_err());
    }

    #[test]
    fn renders_friendly_message_for_no_results() {
        let out = render_results("zebra", &[]);
        assert!(out.starts_with("No results found for \"zebra\""));
    }

    #[test]
    fn renders_ranked_results() {
        let out = render_results("api", &[result(10, Some("**API** Reference..."))]);
        assert!(out.starts_with("1 result for \"api\""));
        assert!(out.contains("1. API Reference [Reference / intermediate] score 10"));
        assert!(out.contains("matched: api"));
        assert!(out.contains("**API** Reference..."));
    }

    #[test]
    fn renders_facets_in_sorted_order() {
        let mut facets = Facets::default();
        facets.categories.insert("Whitepaper".to_string());
        facets.categories.insert("Tutorial".to_string());
        facets.audiences.insert("developers".to_string());
        let out = render_facets(&facets);
        assert!(out.contains("categories:   Tutorial, Whitepaper\n"));
        assert!(out.contains("audiences:    developers\n"));
        assert!(out.contains("difficulties: beginner, intermediate, advanced, expert\n"));
    }

    #[test]
    fn renders_session_updates() {
        assert_eq!(render_update(&SessionUpdate::Cleared), "(query cleared)\n");
        assert!(render_update(&SessionUpdate::Loading {
            query: "api".to_string()
        })
        .contains("searching \"api\""));
    }
}
