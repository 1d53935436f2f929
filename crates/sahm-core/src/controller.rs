//! Explore controller: accumulated listing plus debounced search.
//!
//! Two independent streams share one lock:
//!
//! | Stream  | Driven by                 | Ordering guard        |
//! |---------|---------------------------|-----------------------|
//! | listing | `start`/`refresh`/`load_more` | generation counter |
//! | search  | `search(query)` keystrokes | sequence number      |
//!
//! The lock is never held across an await. Every network completion
//! re-checks its generation or sequence before touching state, so a stale
//! page or an out-of-order search result is dropped instead of applied.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::client::{StockSource, DEFAULT_SEARCH_EXCHANGE};
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::params::{ListParams, DEFAULT_MARKET};
use crate::scroll::{InfiniteScroll, ScrollGate, Viewport, DEFAULT_SCROLL_THRESHOLD};
use crate::{dedup_by_ticker, ClientError, ListingPage, SearchQuery, StockRecord};

/// Quiet period after the last keystroke before a search is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

const LOADING_MORE_MESSAGE: &str = "Loading more stocks...";

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub page_size: usize,
    /// Exchange filter for the accumulated listing. Search scoping is the client's concern.
    pub exchange: Option<String>,
    pub search_limit: usize,
    pub debounce: Duration,
    pub scroll_threshold: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_LIMIT,
            exchange: Some(String::from(DEFAULT_SEARCH_EXCHANGE)),
            search_limit: DEFAULT_SEARCH_LIMIT,
            debounce: SEARCH_DEBOUNCE,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }
}

/// Lifecycle state of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    #[default]
    Idle,
    LoadingInitial,
    Ready,
    LoadingMore,
    Error,
    RateLimited,
}

impl StreamPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingInitial => "loading_initial",
            Self::Ready => "ready",
            Self::LoadingMore => "loading_more",
            Self::Error => "error",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// What a `refresh`/`load_more` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and merged.
    Applied,
    /// Guard conditions held; no request was issued.
    Skipped,
    /// A page arrived after a newer refresh or after close, and was dropped.
    Discarded,
    /// The request failed; the error is on the snapshot.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Transient message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

/// Point-in-time copy of controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreSnapshot {
    pub listing: Vec<StockRecord>,
    pub search_results: Vec<StockRecord>,
    /// Debounced query currently in effect. Only ever holds searchable queries.
    pub active_query: Option<String>,
    pub listing_phase: StreamPhase,
    pub search_phase: StreamPhase,
    pub has_more: bool,
    pub listing_error: Option<ClientError>,
    pub search_error: Option<ClientError>,
    pub notification_dismissed: bool,
}

impl ExploreSnapshot {
    pub fn is_searching(&self) -> bool {
        self.active_query.is_some()
    }

    fn selected_phase(&self) -> StreamPhase {
        if self.is_searching() {
            self.search_phase
        } else {
            self.listing_phase
        }
    }

    pub fn is_loading(&self) -> bool {
        self.selected_phase() == StreamPhase::LoadingInitial
    }

    pub fn is_loading_more(&self) -> bool {
        self.listing_phase == StreamPhase::LoadingMore
    }

    pub fn is_rate_limited(&self) -> bool {
        self.selected_phase() == StreamPhase::RateLimited
    }

    pub fn error(&self) -> Option<&ClientError> {
        if self.is_searching() {
            self.search_error.as_ref()
        } else {
            self.listing_error.as_ref()
        }
    }

    /// Records to render: search results while searching, else the listing.
    pub fn visible_records(&self) -> Vec<StockRecord> {
        let selected = if self.is_searching() {
            &self.search_results
        } else {
            &self.listing
        };
        dedup_by_ticker(selected.iter().cloned())
    }

    /// The listing is exhausted and fully shown.
    pub fn end_of_listing(&self) -> bool {
        !self.is_searching()
            && !self.listing.is_empty()
            && !self.has_more
            && !self.is_loading_more()
    }

    pub fn notification(&self) -> Option<Notification> {
        if let Some(error) = self.error().filter(|_| !self.notification_dismissed) {
            let severity = if error.is_rate_limited() {
                Severity::Warning
            } else {
                Severity::Error
            };
            return Some(Notification {
                severity,
                message: error.message().to_owned(),
            });
        }

        (!self.is_searching() && self.is_loading_more()).then(|| Notification {
            severity: Severity::Info,
            message: String::from(LOADING_MORE_MESSAGE),
        })
    }

    pub fn scroll_gate(&self) -> ScrollGate {
        ScrollGate {
            has_more: self.has_more,
            is_loading_more: self.is_loading_more(),
            is_rate_limited: self.listing_phase == StreamPhase::RateLimited,
            is_searching: self.is_searching(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    Initial,
    More,
}

#[derive(Debug, Default)]
struct ListingState {
    phase: StreamPhase,
    records: Vec<StockRecord>,
    seen: HashSet<String>,
    cursor: Option<String>,
    has_more: bool,
    error: Option<ClientError>,
    generation: u64,
}

impl ListingState {
    fn clear_records(&mut self) {
        self.records.clear();
        self.seen.clear();
    }

    /// Append records whose ticker is not yet present. Returns how many were added.
    fn append(&mut self, records: Vec<StockRecord>) -> usize {
        let before = self.records.len();
        for record in records {
            if self.seen.insert(record.ticker.clone()) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }
}

#[derive(Debug, Default)]
struct SearchState {
    phase: StreamPhase,
    results: Vec<StockRecord>,
    error: Option<ClientError>,
    active_query: Option<SearchQuery>,
    sequence: u64,
    pending: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct Shared {
    listing: ListingState,
    search: SearchState,
    closed: bool,
    notification_dismissed: bool,
}

struct Inner {
    source: Arc<dyn StockSource>,
    config: ControllerConfig,
    shared: Mutex<Shared>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listing_params(&self, cursor: Option<String>) -> ListParams {
        let mut params = ListParams::new()
            .with_limit(self.config.page_size)
            .with_active(true)
            .with_market(DEFAULT_MARKET);
        if let Some(exchange) = &self.config.exchange {
            params = params.with_exchange(exchange.clone());
        }
        if let Some(cursor) = cursor {
            params = params.with_cursor(cursor);
        }
        params
    }

    async fn run_listing(&self, kind: LoadKind) -> LoadOutcome {
        let Some((generation, params)) = self.begin_listing(kind) else {
            return LoadOutcome::Skipped;
        };
        let result = self.source.fetch_listing(params).await;
        self.finish_listing(generation, kind, result)
    }

    fn begin_listing(&self, kind: LoadKind) -> Option<(u64, ListParams)> {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if shared.closed {
            return None;
        }

        let listing = &mut shared.listing;
        let cursor = match kind {
            LoadKind::Initial => {
                listing.generation += 1;
                listing.clear_records();
                listing.cursor = None;
                listing.has_more = true;
                listing.error = None;
                listing.phase = StreamPhase::LoadingInitial;
                shared.notification_dismissed = false;
                None
            }
            LoadKind::More => {
                let retryable = matches!(listing.phase, StreamPhase::Ready | StreamPhase::Error);
                if !retryable || !listing.has_more {
                    tracing::debug!(phase = listing.phase.as_str(), "load more skipped");
                    return None;
                }
                let cursor = listing.cursor.clone()?;
                listing.error = None;
                listing.phase = StreamPhase::LoadingMore;
                Some(cursor)
            }
        };

        tracing::debug!(
            generation = listing.generation,
            phase = listing.phase.as_str(),
            "listing stream transition"
        );
        Some((listing.generation, self.listing_params(cursor)))
    }

    fn finish_listing(
        &self,
        generation: u64,
        kind: LoadKind,
        result: Result<ListingPage, ClientError>,
    ) -> LoadOutcome {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if shared.closed || shared.listing.generation != generation {
            tracing::debug!(generation, "discarding stale listing completion");
            return LoadOutcome::Discarded;
        }

        let listing = &mut shared.listing;
        if kind == LoadKind::Initial {
            listing.clear_records();
        }

        match result {
            Ok(page) => {
                let cursor = page.next_cursor();
                let added = listing.append(page.results);
                listing.has_more = cursor.is_some();
                listing.cursor = cursor;
                listing.error = None;
                listing.phase = StreamPhase::Ready;
                tracing::debug!(
                    added,
                    total = listing.records.len(),
                    has_more = listing.has_more,
                    "listing page applied"
                );
                LoadOutcome::Applied
            }
            Err(error) => {
                listing.phase = if error.is_rate_limited() {
                    StreamPhase::RateLimited
                } else {
                    StreamPhase::Error
                };
                tracing::warn!(
                    code = error.code(),
                    phase = listing.phase.as_str(),
                    kept = listing.records.len(),
                    "listing load failed"
                );
                listing.error = Some(error);
                shared.notification_dismissed = false;
                LoadOutcome::Failed
            }
        }
    }

    fn schedule_search(self: &Arc<Self>, input: &str) {
        let query = SearchQuery::new(input);
        let mut guard = self.lock();
        if guard.closed {
            return;
        }

        let search = &mut guard.search;
        search.sequence += 1;
        if let Some(pending) = search.pending.take() {
            pending.abort();
        }

        if !query.is_searchable() {
            search.results.clear();
            search.error = None;
            search.active_query = None;
            search.phase = StreamPhase::Idle;
            tracing::debug!(len = query.len(), "query below minimum length, search cleared");
            return;
        }

        let sequence = search.sequence;
        let delay = self.config.debounce;
        let inner = Arc::clone(self);
        search.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.run_search(sequence, query).await;
        }));
    }

    async fn run_search(&self, sequence: u64, query: SearchQuery) -> LoadOutcome {
        if !self.begin_search(sequence, &query) {
            return LoadOutcome::Discarded;
        }
        let result = self
            .source
            .fetch_search(query.as_str().to_owned(), self.config.search_limit)
            .await;
        self.finish_search(sequence, result)
    }

    fn begin_search(&self, sequence: u64, query: &SearchQuery) -> bool {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if shared.closed || shared.search.sequence != sequence {
            return false;
        }

        let search = &mut shared.search;
        search.phase = StreamPhase::LoadingInitial;
        search.active_query = Some(query.clone());
        search.error = None;
        shared.notification_dismissed = false;
        tracing::debug!(sequence, query = %query, "search stream transition");
        true
    }

    fn finish_search(
        &self,
        sequence: u64,
        result: Result<Vec<StockRecord>, ClientError>,
    ) -> LoadOutcome {
        let mut guard = self.lock();
        let shared = &mut *guard;
        if shared.closed || shared.search.sequence != sequence {
            tracing::debug!(sequence, "discarding superseded search completion");
            return LoadOutcome::Discarded;
        }

        let search = &mut shared.search;
        match result {
            Ok(records) => {
                tracing::debug!(sequence, results = records.len(), "search results applied");
                search.results = records;
                search.phase = StreamPhase::Ready;
                LoadOutcome::Applied
            }
            Err(error) => {
                search.results.clear();
                search.phase = if error.is_rate_limited() {
                    StreamPhase::RateLimited
                } else {
                    StreamPhase::Error
                };
                tracing::warn!(code = error.code(), "search failed");
                search.error = Some(error);
                shared.notification_dismissed = false;
                LoadOutcome::Failed
            }
        }
    }

    fn take_pending_search(&self) -> Option<JoinHandle<()>> {
        self.lock().search.pending.take()
    }

    fn shutdown(&self) {
        let mut shared = self.lock();
        shared.closed = true;
        if let Some(pending) = shared.search.pending.take() {
            pending.abort();
        }
    }
}

/// Drives an accumulated ticker listing and a debounced search over a [`StockSource`].
///
/// `search` spawns its debounce timer on the ambient tokio runtime and must be
/// called from within one.
pub struct ExploreController {
    inner: Arc<Inner>,
    trigger: InfiniteScroll,
}

impl ExploreController {
    pub fn new(source: Arc<dyn StockSource>, config: ControllerConfig) -> Self {
        let trigger = InfiniteScroll::new(config.scroll_threshold);
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                shared: Mutex::new(Shared::default()),
            }),
            trigger,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Initial load. Same as [`refresh`](Self::refresh).
    pub async fn start(&self) -> LoadOutcome {
        self.refresh().await
    }

    /// Reset the listing and fetch its first page.
    ///
    /// A `load_more` still in flight when this is called is discarded on completion.
    pub async fn refresh(&self) -> LoadOutcome {
        self.inner.run_listing(LoadKind::Initial).await
    }

    /// Fetch the next page using the stored cursor.
    ///
    /// No-op while a previous call is in flight, after a rate-limit failure,
    /// or once the listing is exhausted. A failed page is retried with the
    /// same cursor and the records already loaded are kept.
    pub async fn load_more(&self) -> LoadOutcome {
        self.inner.run_listing(LoadKind::More).await
    }

    /// Feed the latest query text. Restarts the debounce window.
    pub fn search(&self, query: &str) {
        self.inner.schedule_search(query);
    }

    /// Wait for the currently scheduled search, if any, to finish.
    pub async fn settle_search(&self) {
        let Some(pending) = self.inner.take_pending_search() else {
            return;
        };
        if let Err(error) = pending.await {
            if !error.is_cancelled() {
                tracing::warn!(%error, "search task failed");
            }
        }
    }

    /// Call `load_more` if the viewport is close enough to the bottom.
    pub async fn on_scroll(&self, viewport: &dyn Viewport) -> LoadOutcome {
        let gate = self.scroll_gate();
        if !self.trigger.should_load_more(viewport.metrics(), gate) {
            return LoadOutcome::Skipped;
        }
        self.load_more().await
    }

    pub fn dismiss_notification(&self) {
        self.inner.lock().notification_dismissed = true;
    }

    /// Stop the controller. Pending searches are cancelled and late completions dropped.
    pub fn close(&self) {
        self.inner.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn snapshot(&self) -> ExploreSnapshot {
        let shared = self.inner.lock();
        ExploreSnapshot {
            listing: shared.listing.records.clone(),
            search_results: shared.search.results.clone(),
            active_query: shared
                .search
                .active_query
                .as_ref()
                .map(|query| query.as_str().to_owned()),
            listing_phase: shared.listing.phase,
            search_phase: shared.search.phase,
            has_more: shared.listing.has_more,
            listing_error: shared.listing.error.clone(),
            search_error: shared.search.error.clone(),
            notification_dismissed: shared.notification_dismissed,
        }
    }

    fn scroll_gate(&self) -> ScrollGate {
        let shared = self.inner.lock();
        ScrollGate {
            has_more: shared.listing.has_more,
            is_loading_more: shared.listing.phase == StreamPhase::LoadingMore,
            is_rate_limited: shared.listing.phase == StreamPhase::RateLimited,
            is_searching: shared.search.active_query.is_some(),
        }
    }
}

impl Drop for ExploreController {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl std::fmt::Debug for ExploreController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExploreController")
            .field("config", &self.inner.config)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
