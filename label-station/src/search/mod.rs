//! Search controller
//!
//! Translates raw keystrokes into index queries without blocking the
//! interactive boundary and without firing a query per keystroke.
//!
//! State machine: Idle -> Debouncing -> Querying -> Idle. Each keystroke
//! re-arms a single-shot timer; only the last keystroke of a burst fires.
//! An explicit submit (Enter / the Search button) bypasses the debounce.
//! Queries run on a blocking worker over an index snapshot; results carry a
//! generation stamp and a stale result is discarded instead of overwriting
//! the display state of a newer query.

use crate::index::ItemIndex;
use shared::{ItemRecord, SearchField, SearchMode, SearchRequest};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Input events from the UI boundary
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCommand {
    /// The search box content changed (debounced, exact-binary mode)
    TextChanged(String),
    /// Enter or the Search button (immediate, multi-keyword mode)
    Submit(String),
}

/// One delivered result set, truncated to the display cap
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub generation: u64,
    pub query: String,
    pub rows: Vec<ItemRecord>,
}

/// Debouncing search front-end over an [`ItemIndex`]
pub struct SearchController {
    index: ItemIndex,
    display_cap: usize,
    debounce: Duration,
    field: SearchField,
    issued: Arc<AtomicU64>,
}

impl SearchController {
    pub fn new(index: ItemIndex, display_cap: usize, debounce: Duration) -> Self {
        Self {
            index,
            display_cap,
            debounce,
            field: SearchField::default(),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Field(s) the multi-keyword mode matches against
    pub fn with_search_field(mut self, field: SearchField) -> Self {
        self.field = field;
        self
    }

    /// Run the controller loop until the command channel closes or
    /// `shutdown` fires
    pub async fn run(
        self,
        mut commands: mpsc::Receiver<SearchCommand>,
        results: mpsc::Sender<SearchOutcome>,
        shutdown: CancellationToken,
    ) {
        info!(debounce_ms = self.debounce.as_millis() as u64, "Search controller started");

        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);
        let mut armed = false;
        let mut pending: Option<String> = None;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Search controller received shutdown signal");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("Command channel closed, search controller stopping");
                        break;
                    };
                    match command {
                        SearchCommand::TextChanged(query) => {
                            pending = Some(query);
                            timer.as_mut().reset(tokio::time::Instant::now() + self.debounce);
                            armed = true;
                        }
                        SearchCommand::Submit(query) => {
                            // Submit supersedes any pending debounce.
                            armed = false;
                            pending = None;
                            let request =
                                SearchRequest::new(query, SearchMode::SubstringMultiKeyword);
                            self.execute(request, &results).await;
                        }
                    }
                }
                _ = &mut timer, if armed => {
                    armed = false;
                    if let Some(query) = pending.take() {
                        let request = SearchRequest::new(query, SearchMode::ExactBinary);
                        self.execute(request, &results).await;
                    }
                }
            }
        }
    }

    /// Issue one query
    ///
    /// Takes an index snapshot, stamps the query with a fresh generation and
    /// runs the scan on a blocking worker. Delivery is skipped if a newer
    /// generation was issued while this one was in flight.
    async fn execute(&self, request: SearchRequest, results: &mpsc::Sender<SearchOutcome>) {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.index.snapshot().await;
        let issued = Arc::clone(&self.issued);
        let results = results.clone();
        let cap = self.display_cap;
        let field = self.field;

        debug!(generation, query = %request.query, mode = ?request.mode, "Query dispatched");

        tokio::spawn(async move {
            let SearchRequest { query, mode } = request;
            let scan_query = query.clone();
            let rows = tokio::task::spawn_blocking(move || {
                let trimmed = scan_query.trim();
                if trimmed.is_empty() {
                    // Empty query: first rows in sort order, no search.
                    return snapshot.prefix_view(cap);
                }
                match mode {
                    SearchMode::ExactBinary => snapshot.exact_lookup(trimmed),
                    SearchMode::SubstringMultiKeyword => {
                        snapshot.substring_filter(trimmed, field)
                    }
                }
            })
            .await;

            let mut rows = match rows {
                Ok(rows) => rows,
                Err(e) => {
                    error!(error = %e, "Search worker panicked");
                    return;
                }
            };

            if issued.load(Ordering::SeqCst) != generation {
                debug!(generation, "Stale result discarded");
                return;
            }

            rows.truncate(cap);
            if rows.is_empty() {
                debug!(generation, query = %query, "No items matched");
            }
            let _ = results
                .send(SearchOutcome {
                    generation,
                    query,
                    rows,
                })
                .await;
        });
    }
}
