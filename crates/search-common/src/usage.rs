use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::redis::RedisCache;

const USAGE_KEY: &str = "docs_search:usage";
const SEARCHES_FIELD: &str = "searches";
const ZERO_RESULTS_FIELD: &str = "zero_result_searches";
const TERM_FIELD_PREFIX: &str = "term:";
const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UsageStats {
    pub total_searches: u64,
    pub zero_result_searches: u64,
    /// Most frequently searched tokens, highest count first.
    pub top_terms: Vec<TermCount>,
    pub redis_available: bool,
}

/// Anonymous search counters. Nothing identifying the caller is stored, only
/// how often searches ran, how many came back empty and which tokens were used.
#[derive(Clone)]
pub struct UsageTracker {
    redis: RedisCache,
}

impl UsageTracker {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn record(&self, tokens: &[String], result_count: usize) {
        if !self.redis.is_configured() {
            return;
        }

        let _ = self.redis.hincr_by(USAGE_KEY, SEARCHES_FIELD, 1).await;
        if result_count == 0 {
            let _ = self.redis.hincr_by(USAGE_KEY, ZERO_RESULTS_FIELD, 1).await;
        }
        for token in tokens {
            let _ = self
                .redis
                .hincr_by(USAGE_KEY, &format!("{TERM_FIELD_PREFIX}{token}"), 1)
                .await;
        }
    }

    pub async fn get_usage_stats(&self) -> UsageStats {
        let redis_available = self.redis.is_available().await;
        let entries = self.redis.hgetall(USAGE_KEY).await.unwrap_or_default();
        let mut stats = stats_from_entries(entries);
        stats.redis_available = redis_available;
        stats
    }
}

fn stats_from_entries(entries: Vec<(String, String)>) -> UsageStats {
    let mut total_searches = 0;
    let mut zero_result_searches = 0;
    let mut terms: HashMap<String, u64> = HashMap::new();

    for (field, value) in entries {
        let parsed = value.parse::<u64>().unwrap_or(0);
        match field.as_str() {
            SEARCHES_FIELD => total_searches = parsed,
            ZERO_RESULTS_FIELD => zero_result_searches = parsed,
            other => {
                if let Some(term) = other.strip_prefix(TERM_FIELD_PREFIX) {
                    terms.insert(term.to_string(), parsed);
                }
            }
        }
    }

    let mut top_terms: Vec<TermCount> = terms
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    top_terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    top_terms.truncate(TOP_TERMS);

    UsageStats {
        total_searches,
        zero_result_searches,
        top_terms,
        redis_available: false,
    }
}
