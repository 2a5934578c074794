/// Redis caching layer for search results.
///
/// All operations degrade gracefully: with Redis absent, `get` misses and `set`
/// is a no-op, and the caller simply runs the (cheap, pure) search.
///
/// Key schema: `docs:v1:{catalog_fingerprint}:search:{sha256(query + options)}`.
/// Embedding the catalog fingerprint means a changed catalog never serves stale
/// results; old entries age out through the TTL.
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::AppError;
use crate::model::{SearchOptions, SearchResult};
use search_common::redis::RedisCache;

const KEY_PREFIX: &str = "docs:v1:";
const SEARCH_TTL_SECS: u64 = 3600;

pub struct SearchCache {
    redis: RedisCache,
    namespace: String,
}

impl SearchCache {
    pub fn new(redis: RedisCache, catalog_fingerprint: &str) -> Self {
        Self {
            redis,
            namespace: format!("{KEY_PREFIX}{catalog_fingerprint}:"),
        }
    }

    pub async fn get_search_results(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Option<Vec<SearchResult>> {
        let key = self.search_key(query, options);
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_search_results(
        &self,
        query: &str,
        options: &SearchOptions,
        results: &[SearchResult],
    ) {
        let key = self.search_key(query, options);
        if let Ok(json) = serde_json::to_string(results) {
            self.redis.set_with_ttl(&key, &json, SEARCH_TTL_SECS).await;
        }
    }

    /// Report whether the backing Redis answers.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.redis.ping().await?;
        Ok(())
    }

    /// Deterministic key over the query and every option that changes the output.
    /// Hashing the serialized pair keeps field boundaries unambiguous.
    fn search_key(&self, query: &str, options: &SearchOptions) -> String {
        let mut hasher = Sha256::new();
        match serde_json::to_vec(&(query, options)) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(query.as_bytes()),
        }
        let hash = hasher.finalize();
        format!("{}search:{:x}", self.namespace, hash)
    }
}
