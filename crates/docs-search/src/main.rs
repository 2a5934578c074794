use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docs_search::cache::SearchCache;
use docs_search::catalog;
use docs_search::cli::{self, Cli, Commands};
use docs_search::config::Config;
use docs_search::error::AppError;
use docs_search::model::SearchOptions;
use docs_search::search::{EngineConfig, SearchEngine};
use docs_search::server::{self, DocsSearchServer};
use docs_search::session::{SearchHistory, SearchSession, SessionUpdate};
use docs_search::snippet::SnippetConfig;
use search_common::redis::RedisCache;
use search_common::usage::UsageTracker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries results or MCP JSON-RPC.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }

    match cli.command {
        Commands::Search {
            query,
            filters,
            no_snippets,
            json,
        } => {
            let engine = load_engine(&config, text_markers(!json))?;
            let results = engine.search(&query, &filters.to_options(!no_snippets));
            info!(query, results = results.len(), "search complete");
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", cli::render_results(&query, &results));
            }
        }
        Commands::Facets { json } => {
            let engine = load_engine(&config, SnippetConfig::default())?;
            if json {
                let facets = server::facets_response(&engine);
                println!("{}", serde_json::to_string_pretty(&facets)?);
            } else {
                print!("{}", cli::render_facets(engine.facets()));
            }
        }
        Commands::Interactive {
            filters,
            history,
            debounce_ms,
        } => {
            let engine = Arc::new(load_engine(&config, text_markers(true))?);
            let debounce = debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(config.debounce);
            run_interactive(engine, filters.to_options(true), debounce, history).await?;
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

/// Load the configured catalog (or the builtin one) and build the engine.
fn load_engine(config: &Config, snippet: SnippetConfig) -> Result<SearchEngine, AppError> {
    let documents = match &config.catalog_path {
        Some(path) => {
            info!(path = %path.display(), "loading catalog");
            catalog::load_catalog(path)?
        }
        None => catalog::builtin_catalog()?,
    };

    let engine_config = EngineConfig {
        snippet,
        ..config.engine_config()
    };
    let engine = SearchEngine::new(documents, engine_config)?;
    info!(
        documents = engine.catalog().len(),
        terms = engine.index().len(),
        categories = engine.facets().categories.len(),
        partial_match = ?engine.config().partial_match,
        "catalog indexed"
    );
    Ok(engine)
}

fn text_markers(plain_text: bool) -> SnippetConfig {
    if plain_text {
        SnippetConfig {
            open_marker: cli::TEXT_OPEN_MARKER.to_string(),
            close_marker: cli::TEXT_CLOSE_MARKER.to_string(),
            ..SnippetConfig::default()
        }
    } else {
        SnippetConfig::default()
    }
}

async fn run_interactive(
    engine: Arc<SearchEngine>,
    options: SearchOptions,
    debounce: Duration,
    history_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let history = match &history_path {
        Some(path) => SearchHistory::load(path)?,
        None => SearchHistory::default(),
    };
    if !history.is_empty() {
        let recent: Vec<&str> = history.entries().collect();
        println!("recent: {}", recent.join(" | "));
    }

    let (input, mut updates) = SearchSession::spawn(engine, options, debounce).split();
    let printer = tokio::spawn(async move {
        let mut history = history;
        while let Some(update) = updates.recv().await {
            if let SessionUpdate::Results { query, .. } = &update {
                history = history.record(query);
            }
            print!("{}", cli::render_update(&update));
        }
        history
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !input.edit(line).await {
            break;
        }
    }
    input.finish().await;

    let history = printer.await?;
    if let Some(path) = history_path {
        history.save(&path)?;
        info!(path = %path.display(), entries = history.len(), "history saved");
    }
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("starting docs-search MCP server");

    let engine = Arc::new(load_engine(&config, SnippetConfig::default())?);

    // Redis is optional; search works identically without it.
    let redis = RedisCache::new(config.redis_url.as_deref());
    let cache = Arc::new(SearchCache::new(redis.clone(), engine.catalog_fingerprint()));
    match cache.ping().await {
        Ok(()) => info!("redis connected"),
        Err(e) => info!(reason = %e, "redis unavailable, running without cache"),
    }
    let usage = UsageTracker::new(redis);

    let server = DocsSearchServer::new(engine, cache, usage);

    if let Some(addr) = &config.tcp_listen_addr {
        let listener = TcpListener::bind(addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
