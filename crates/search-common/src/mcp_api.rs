use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchDocsParams {
    /// Free-text keywords, e.g. "quantum consensus".
    pub query: String,
    /// Only return documents written for this audience, e.g. "developers".
    pub audience: Option<String>,
    /// Only return documents in this category, e.g. "Whitepaper".
    pub category: Option<String>,
    /// Maximum number of results to return (default: 10, max: 50).
    pub limit: Option<u32>,
    /// Include highlighted snippets (default: true).
    pub include_snippets: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDocumentParams {
    /// Document identifier such as "api-reference".
    pub document_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListCategoryParams {
    /// Category label such as "Whitepaper" or "Developer Guide".
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub category: String,
    pub difficulty: String,
    pub score: u32,
    pub matched_terms: Vec<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDocsResponse {
    pub query: String,
    pub results: Vec<DocumentHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentDetailResponse {
    pub id: String,
    pub title: String,
    pub url: String,
    pub category: String,
    pub content: String,
    pub tags: Vec<String>,
    pub audience: Vec<String>,
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryListResponse {
    pub category: String,
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FacetsResponse {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub audiences: Vec<String>,
    /// Difficulty levels from easiest to hardest.
    pub difficulties: Vec<String>,
}
