/// MCP server exposing the documentation search.
///
/// Tools:
/// - `search_docs`: keyword search with optional audience/category filters
/// - `get_document`: look up one catalog record by id
/// - `list_category`: list the documents in a category
/// - `list_facets`: available categories, tags, audiences and difficulty levels
/// - `usage_stats`: anonymous search counters (requires Redis)
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use crate::cache::SearchCache;
use crate::index::query_tokens;
use crate::model::{Difficulty, DocumentRecord, SearchOptions, SearchResult};
use crate::search::SearchEngine;
use search_common::mcp_api::{
    CategoryListResponse, DocumentDetailResponse, DocumentHit, DocumentSummary, FacetsResponse,
    GetDocumentParams, ListCategoryParams, SearchDocsParams, SearchDocsResponse,
};
use search_common::usage::{UsageStats, UsageTracker};

const MAX_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct DocsSearchServer {
    engine: Arc<SearchEngine>,
    cache: Arc<SearchCache>,
    usage: UsageTracker,
    tool_router: ToolRouter<DocsSearchServer>,
}

impl DocsSearchServer {
    pub fn new(engine: Arc<SearchEngine>, cache: Arc<SearchCache>, usage: UsageTracker) -> Self {
        Self {
            engine,
            cache,
            usage,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl DocsSearchServer {
    #[tool(description = "Search the documentation catalog by keywords. Optionally filter by audience (e.g. 'developers') or category (e.g. 'Whitepaper'). Returns ranked results with highlighted snippets.")]
    async fn search_docs(
        &self,
        Parameters(params): Parameters<SearchDocsParams>,
    ) -> Result<Json<SearchDocsResponse>, String> {
        let query = params.query.trim().to_string();
        let options = SearchOptions {
            audience: non_blank(params.audience),
            category: non_blank(params.category),
            max_results: Some(params.limit.unwrap_or(10).min(MAX_LIMIT) as usize),
            include_snippets: params.include_snippets.unwrap_or(true),
        };

        let results = match self.cache.get_search_results(&query, &options).await {
            Some(cached) => {
                info!(query, "search cache hit");
                cached
            }
            None => {
                let results = self.engine.search(&query, &options);
                self.cache
                    .set_search_results(&query, &options, &results)
                    .await;
                results
            }
        };

        let tokens = query_tokens(&query);
        if !tokens.is_empty() {
            self.usage.record(&tokens, results.len()).await;
        }

        Ok(Json(SearchDocsResponse {
            query,
            results: results.into_iter().map(to_hit).collect(),
        }))
    }

    #[tool(description = "Get the full catalog record for a document by ID (e.g. 'api-reference', 'quantum-consensus').")]
    async fn get_document(
        &self,
        Parameters(params): Parameters<GetDocumentParams>,
    ) -> Result<Json<DocumentDetailResponse>, String> {
        let document_id = params.document_id.trim().to_string();
        if document_id.is_empty() {
            return Err("document_id must not be empty".to_string());
        }

        let document = self
            .engine
            .document(&document_id)
            .map_err(|e| e.to_string())?;
        Ok(Json(to_detail(document)))
    }

    #[tool(description = "List all documents in a category such as 'Whitepaper', 'Developer Guide', 'Reference' or 'Tutorial', easiest first.")]
    async fn list_category(
        &self,
        Parameters(params): Parameters<ListCategoryParams>,
    ) -> Result<Json<CategoryListResponse>, String> {
        let category = params.category.trim().to_string();
        if category.is_empty() {
            return Err("category must not be empty".to_string());
        }

        let documents = self.engine.documents_in_category(&category);
        let Some(first) = documents.first() else {
            let available: Vec<&str> = self
                .engine
                .facets()
                .categories
                .iter()
                .map(String::as_str)
                .collect();
            return Err(format!(
                "unknown category: '{category}'. Available categories: {}",
                available.join(", ")
            ));
        };

        Ok(Json(CategoryListResponse {
            category: first.category.clone(),
            documents: documents
                .iter()
                .map(|d| DocumentSummary {
                    id: d.id.clone(),
                    title: d.title.clone(),
                    difficulty: d.difficulty.to_string(),
                })
                .collect(),
        }))
    }

    #[tool(description = "List the categories, tags, audiences and difficulty levels available for filtering.")]
    async fn list_facets(&self) -> Result<Json<FacetsResponse>, String> {
        Ok(Json(facets_response(&self.engine)))
    }

    #[tool(description = "Anonymous search usage counters: total searches, searches with no results and the most searched terms.")]
    async fn usage_stats(&self) -> Result<Json<UsageStats>, String> {
        Ok(Json(self.usage.get_usage_stats().await))
    }
}

pub fn facets_response(engine: &SearchEngine) -> FacetsResponse {
    let facets = engine.facets();
    FacetsResponse {
        categories: facets.categories.iter().cloned().collect(),
        tags: facets.tags.iter().cloned().collect(),
        audiences: facets.audiences.iter().cloned().collect(),
        difficulties: Difficulty::ALL.iter().map(|d| d.to_string()).collect(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_hit(result: SearchResult) -> DocumentHit {
    let SearchResult {
        document,
        score,
        matched_terms,
        snippet,
    } = result;
    DocumentHit {
        difficulty: document.difficulty.to_string(),
        id: document.id,
        title: document.title,
        url: document.url,
        category: document.category,
        score,
        matched_terms,
        snippet,
    }
}

fn to_detail(document: &DocumentRecord) -> DocumentDetailResponse {
    DocumentDetailResponse {
        id: document.id.clone(),
        title: document.title.clone(),
        url: document.url.clone(),
        category: document.category.clone(),
        content: document.content.clone(),
        tags: document.tags.clone(),
        audience: document.audience.clone(),
        difficulty: document.difficulty.to_string(),
    }
}

#[tool_handler]
impl ServerHandler for DocsSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "docs-search".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Documentation search MCP server. Provides keyword search over the \
                 documentation catalog (whitepapers, developer guides, reference, \
                 tutorials). Use search_docs for keyword queries, get_document for a \
                 specific record, list_category for browsing and list_facets to \
                 discover valid filter values."
                    .to_string(),
            ),
        }
    }
}
