use std::fmt;

use serde::{Deserialize, Serialize};

/// A single entry in the documentation catalog (e.g. the consensus whitepaper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique identifier, e.g. "api-reference"
    pub id: String,
    /// Display title, e.g. "API Reference"
    pub title: String,
    /// Relative link, passed through untouched
    pub url: String,
    /// Classification label, e.g. "Whitepaper", "Developer Guide"
    pub category: String,
    /// Short description used for matching (not the full document body)
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Intended readers, e.g. "developers", "researchers"
    #[serde(default)]
    pub audience: Vec<String>,
    pub difficulty: Difficulty,
}

/// Reading difficulty, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
    ];

    /// Position in the fixed order: beginner=0 .. expert=3.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-query knobs. `max_results: None` falls back to the engine default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub audience: Option<String>,
    pub category: Option<String>,
    pub max_results: Option<usize>,
    pub include_snippets: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            audience: None,
            category: None,
            max_results: None,
            include_snippets: true,
        }
    }
}

/// One ranked hit, built fresh for every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: DocumentRecord,
    pub score: u32,
    /// Distinct query tokens that contributed to the score, in query order
    pub matched_terms: Vec<String>,
    pub snippet: Option<String>,
}
