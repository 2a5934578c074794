/// Interactive search session: debounced query edits and recent-search history.
///
/// Query edits arrive on a channel (one per keystroke, or one per stdin line in the
/// CLI). Edits closer together than the debounce period collapse into a single
/// search of the latest text. The search itself stays synchronous and pure; this
/// module only decides when to call it.
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::index::query_tokens;
use crate::model::{SearchOptions, SearchResult};
use crate::search::SearchEngine;

const CHANNEL_CAPACITY: usize = 64;
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A settled query is about to be searched.
    Loading { query: String },
    Results {
        query: String,
        results: Vec<SearchResult>,
    },
    /// The query was edited down to nothing searchable.
    Cleared,
}

pub struct SearchSession {
    input: mpsc::Sender<String>,
    updates: mpsc::Receiver<SessionUpdate>,
    task: JoinHandle<()>,
}

impl SearchSession {
    pub fn spawn(engine: Arc<SearchEngine>, options: SearchOptions, debounce: Duration) -> Self {
        let (input, edits) = mpsc::channel(CHANNEL_CAPACITY);
        let (updates_tx, updates) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run(engine, options, debounce, edits, updates_tx));
        Self {
            input,
            updates,
            task,
        }
    }

    /// Submit the current query text. Returns `false` once the session has ended.
    pub async fn edit(&self, query: impl Into<String>) -> bool {
        self.input.send(query.into()).await.is_ok()
    }

    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.updates.recv().await
    }

    /// Split into the input side and the update stream, for callers that feed
    /// edits and render updates from separate tasks.
    pub fn split(self) -> (SessionInput, mpsc::Receiver<SessionUpdate>) {
        (
            SessionInput {
                input: self.input,
                task: self.task,
            },
            self.updates,
        )
    }
}

pub struct SessionInput {
    input: mpsc::Sender<String>,
    task: JoinHandle<()>,
}

impl SessionInput {
    pub async fn edit(&self, query: impl Into<String>) -> bool {
        self.input.send(query.into()).await.is_ok()
    }

    /// Close the input, let any pending edit flush, and wait for the session task.
    pub async fn finish(self) {
        drop(self.input);
        if let Err(e) = self.task.await {
            warn!(error = %e, "search session task failed");
        }
    }
}

async fn run(
    engine: Arc<SearchEngine>,
    options: SearchOptions,
    debounce: Duration,
    mut edits: mpsc::Receiver<String>,
    updates: mpsc::Sender<SessionUpdate>,
) {
    while let Some(mut pending) = edits.recv().await {
        let mut open = true;
        loop {
            tokio::select! {
                next = edits.recv() => match next {
                    Some(query) => pending = query,
                    None => {
                        open = false;
                        break;
                    }
                },
                () = sleep(debounce) => break,
            }
        }

        let query = pending.trim().to_string();
        debug!(query, "query settled");
        let delivered = if query_tokens(&query).is_empty() {
            updates.send(SessionUpdate::Cleared).await.is_ok()
        } else {
            let loading = SessionUpdate::Loading {
                query: query.clone(),
            };
            updates.send(loading).await.is_ok() && {
                let results = engine.search(&query, &options);
                updates
                    .send(SessionUpdate::Results { query, results })
                    .await
                    .is_ok()
            }
        };

        if !delivered || !open {
            break;
        }
    }
}

/// Recent searches, most recent first, without duplicates.
///
/// The history is plain data handed in and returned by the caller; nothing here
/// touches global state or storage on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistory {
    entries: VecDeque<String>,
}

impl SearchHistory {
    /// Record `query`, returning the updated history. Blank queries are ignored.
    pub fn record(mut self, query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return self;
        }
        self.entries.retain(|q| !q.eq_ignore_ascii_case(query));
        self.entries.push_front(query.to_string());
        self.entries.truncate(HISTORY_LIMIT);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from a JSON file; a missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
