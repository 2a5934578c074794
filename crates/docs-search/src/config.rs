use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::search::{EngineConfig, PartialMatch, ScoringWeights, DEFAULT_MAX_RESULTS};
use crate::snippet::SnippetConfig;

const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Upper bound for a single scoring weight.
pub const MAX_WEIGHT: u32 = 10_000;

/// Application configuration loaded explicitly from environment variables.
///
/// Every setting is optional. Without `DOCS_CATALOG_PATH` the catalog compiled
/// into the binary is searched; without `REDIS_URL` caching and usage counters
/// are disabled.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON catalog to load instead of the builtin one.
    pub catalog_path: Option<PathBuf>,
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    pub max_results: usize,
    pub weights: ScoringWeights,
    pub partial_match: PartialMatch,
    /// Quiet period before an interactive query edit triggers a search.
    pub debounce: Duration,
    /// TCP address for the MCP server; stdio when absent.
    pub tcp_listen_addr: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `DOCS_CATALOG_PATH`: JSON catalog file (must exist when set)
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    /// - `DOCS_SEARCH_MAX_RESULTS`: default result limit (10)
    /// - `DOCS_SEARCH_EXACT_WEIGHT` / `DOCS_SEARCH_PARTIAL_WEIGHT`: scoring (10 / 5)
    /// - `DOCS_SEARCH_PARTIAL_MODE`: `substring`, `prefix` or `off`
    /// - `DOCS_SEARCH_DEBOUNCE_MS`: interactive debounce (300)
    /// - `MCP_TCP_LISTEN_ADDR`: serve MCP over TCP instead of stdio
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let catalog_path = lookup("DOCS_CATALOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Some(path) = &catalog_path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "catalog not found at {}",
                    path.display()
                )));
            }
        }

        let partial_match = match lookup("DOCS_SEARCH_PARTIAL_MODE") {
            Some(raw) => PartialMatch::parse(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "DOCS_SEARCH_PARTIAL_MODE must be substring, prefix or off (got '{raw}')"
                ))
            })?,
            None => PartialMatch::default(),
        };

        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            exact: parse_var(&lookup, "DOCS_SEARCH_EXACT_WEIGHT", defaults.exact)?,
            partial: parse_var(&lookup, "DOCS_SEARCH_PARTIAL_WEIGHT", defaults.partial)?,
        };
        for (key, weight) in [
            ("DOCS_SEARCH_EXACT_WEIGHT", weights.exact),
            ("DOCS_SEARCH_PARTIAL_WEIGHT", weights.partial),
        ] {
            if weight > MAX_WEIGHT {
                return Err(AppError::Config(format!(
                    "{key} must be at most {MAX_WEIGHT} (got {weight})"
                )));
            }
        }

        Ok(Self {
            catalog_path,
            redis_url: lookup("REDIS_URL"),
            max_results: parse_var(&lookup, "DOCS_SEARCH_MAX_RESULTS", DEFAULT_MAX_RESULTS)?,
            weights,
            partial_match,
            debounce: Duration::from_millis(parse_var(
                &lookup,
                "DOCS_SEARCH_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE_MS,
            )?),
            tcp_listen_addr: lookup("MCP_TCP_LISTEN_ADDR"),
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            weights: self.weights,
            partial_match: self.partial_match,
            default_max_results: self.max_results,
            snippet: SnippetConfig::default(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AppError::Config(format!("{key} must be a non-negative integer (got '{raw}')"))
        }),
        None => Ok(default),
    }
}
