//! Incremental headline loader behind the infinite-scroll view.
//!
//! A [`PagedLoader`] owns one [`CollectionState`]: the headlines loaded so far,
//! the page cursor, the total the source reports and a loading flag. The view
//! calls [`PagedLoader::initial_load`] once when it mounts and
//! [`PagedLoader::load_more`] every time the user scrolls near the bottom.
//!
//! # Merge rules
//!
//! - The initial load replaces the collection with page 1.
//! - Each further page is appended in source order. Nothing is reordered or
//!   de-duplicated, even though `url` is used as a display key.
//! - Loading stops once `items.len() >= total_available`.
//!
//! # Overlapping triggers
//!
//! The cursor advances before the fetch resolves. Under
//! [`FetchPolicy::Overlapping`] a second trigger during an in-flight fetch
//! requests the page after it, and pages are appended in the order their
//! responses arrive, not the order they were requested. The default
//! [`FetchPolicy::SingleFlight`] rejects such a trigger with
//! [`LoadOutcome::Busy`] instead.
//!
//! # Failures
//!
//! A failed fetch is logged and absorbed: loading is cleared, the collection
//! is left as it was and nothing is retried. A failed `load_more` keeps its
//! already-advanced cursor.

use crate::error::LoaderError;
use crate::models::{Article, HeadlinePage, NewsQuery};
use crate::utils::looks_truncated;
use reqwest::Client;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Something that can produce the JSON body of one headline page.
///
/// Implementors only transport bytes; decoding and merging happen in the
/// loader so progress can be reported between the two. The returned future
/// must be `Send` so a loader can be driven from spawned tasks; implementors
/// may still write `async fn`.
pub trait PageSource {
    fn fetch_page(
        &self,
        request: &NewsQuery,
    ) -> impl Future<Output = Result<String, LoaderError>> + Send;
}

/// Receives the coarse 0–100 progress of an initial load.
///
/// The loader reports 10 before the request, 30 when the body has arrived,
/// 70 once it has decoded and 100 after the merge. Nothing is reported past
/// the point of a failure.
pub trait ProgressSink {
    fn set_progress(&self, percent: u8);
}

/// A sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_progress(&self, _percent: u8) {}
}

impl<F> ProgressSink for F
where
    F: Fn(u8),
{
    fn set_progress(&self, percent: u8) {
        self(percent)
    }
}

/// What to do when a trigger arrives while a `load_more` is still in flight.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Reject the trigger with [`LoadOutcome::Busy`]; the cursor stays put.
    #[default]
    SingleFlight,
    /// Advance the cursor and fetch anyway.
    Overlapping,
}

/// The view parameters a loader is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderFilter {
    pub country: String,
    pub category: String,
    pub page_size: u32,
}

impl Default for LoaderFilter {
    fn default() -> Self {
        let q = NewsQuery::default();
        Self {
            country: q.country,
            category: q.category,
            page_size: q.pageSize,
        }
    }
}

/// Everything the view renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionState {
    pub items: Vec<Article>,
    /// The last page requested. Starts at 1.
    pub page: u32,
    /// Total reported by the source; 0 until the first successful load.
    pub total_available: u64,
    pub is_loading: bool,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            total_available: 0,
            is_loading: true,
        }
    }

    /// Whether the scroll trigger should still fire.
    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total_available
    }
}

/// Result of one initial load or scroll trigger.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The page arrived and `added` headlines were merged.
    Loaded { page: u32, added: usize },
    /// The collection already holds everything the source reported.
    Exhausted,
    /// Another `load_more` is still in flight.
    Busy,
    /// The fetch failed; the error has been logged and state left as it was.
    Failed(LoaderError),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

#[derive(Debug)]
struct Inner {
    state: CollectionState,
    in_flight: usize,
}

/// Fetch-and-merge driver for one view's collection.
#[derive(Debug)]
pub struct PagedLoader<S, P = NoProgress> {
    source: S,
    progress: P,
    filter: LoaderFilter,
    policy: FetchPolicy,
    inner: Mutex<Inner>,
}

impl<S: PageSource> PagedLoader<S, NoProgress> {
    pub fn new(source: S, filter: LoaderFilter) -> Self {
        Self::with_progress(source, filter, NoProgress)
    }
}

impl<S: PageSource, P: ProgressSink> PagedLoader<S, P> {
    pub fn with_progress(source: S, filter: LoaderFilter, progress: P) -> Self {
        Self {
            source,
            progress,
            filter,
            policy: FetchPolicy::default(),
            inner: Mutex::new(Inner {
                state: CollectionState::new(),
                in_flight: 0,
            }),
        }
    }

    pub fn policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn filter(&self) -> &LoaderFilter {
        &self.filter
    }

    /// A copy of the current collection state.
    pub fn snapshot(&self) -> CollectionState {
        self.lock().state.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.lock().state.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().state.is_loading
    }

    /// Consume the loader and keep only its collection.
    pub fn into_state(self) -> CollectionState {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Load page 1 and replace the collection with it.
    #[instrument(level = "info", skip_all, fields(country = %self.filter.country, category = %self.filter.category))]
    pub async fn initial_load(&self) -> LoadOutcome {
        self.progress.set_progress(10);
        {
            let mut inner = self.lock();
            inner.state.page = 1;
            inner.state.is_loading = true;
        }

        let request = self.request(1);
        let body = match self.source.fetch_page(&request).await {
            Ok(body) => body,
            Err(e) => return self.fail_initial(e),
        };
        self.progress.set_progress(30);

        let page = match decode(&body) {
            Ok(page) => page,
            Err(e) => return self.fail_initial(e),
        };
        self.progress.set_progress(70);

        let added = {
            let mut inner = self.lock();
            let articles = page.articles.unwrap_or_default();
            let added = articles.len();
            inner.state.items = articles;
            inner.state.total_available = page.totalResults.unwrap_or(0);
            inner.state.is_loading = false;
            info!(
                items = added,
                total_available = inner.state.total_available,
                "Loaded first page"
            );
            added
        };
        self.progress.set_progress(100);

        LoadOutcome::Loaded { page: 1, added }
    }

    /// Fetch the next page and append it.
    ///
    /// Does nothing and returns [`LoadOutcome::Exhausted`] once the collection
    /// has reached the reported total.
    #[instrument(level = "info", skip_all)]
    pub async fn load_more(&self) -> LoadOutcome {
        let (request, guard) = {
            let mut inner = self.lock();
            if !inner.state.has_more() {
                debug!(
                    items = inner.state.items.len(),
                    total_available = inner.state.total_available,
                    "Collection exhausted; not fetching"
                );
                return LoadOutcome::Exhausted;
            }
            if self.policy == FetchPolicy::SingleFlight && inner.in_flight > 0 {
                debug!(page = inner.state.page, "Fetch already in flight; rejecting trigger");
                return LoadOutcome::Busy;
            }
            inner.state.page += 1;
            inner.in_flight += 1;
            (self.request(inner.state.page), InFlight::new(&self.inner))
        };

        let result = match self.source.fetch_page(&request).await {
            Ok(body) => decode(&body),
            Err(e) => Err(e),
        };

        let mut inner = self.lock();
        guard.release(&mut inner);

        match result {
            Ok(page) => {
                let articles = page.articles.unwrap_or_default();
                let added = articles.len();
                inner.state.items.extend(articles);
                if let Some(total) = page.totalResults {
                    inner.state.total_available = total;
                }
                info!(
                    page = request.page,
                    added,
                    items = inner.state.items.len(),
                    total_available = inner.state.total_available,
                    "Appended page"
                );
                LoadOutcome::Loaded {
                    page: request.page,
                    added,
                }
            }
            Err(e) => {
                warn!(page = request.page, error = %e, "Failed to fetch more news");
                LoadOutcome::Failed(e)
            }
        }
    }

    fn fail_initial(&self, e: LoaderError) -> LoadOutcome {
        warn!(error = %e, "Failed to fetch news");
        self.lock().state.is_loading = false;
        LoadOutcome::Failed(e)
    }

    fn request(&self, page: u32) -> NewsQuery {
        NewsQuery {
            country: self.filter.country.clone(),
            category: self.filter.category.clone(),
            page,
            pageSize: self.filter.page_size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode(body: &str) -> Result<HeadlinePage, LoaderError> {
    serde_json::from_str(body).map_err(|e| {
        debug!(truncated = looks_truncated(&e), "Page body did not decode");
        LoaderError::from(e)
    })
}

/// Marks a `load_more` as in flight until released, or until its future is
/// dropped mid-fetch.
struct InFlight<'a> {
    inner: Option<&'a Mutex<Inner>>,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a Mutex<Inner>) -> Self {
        Self { inner: Some(inner) }
    }

    /// Clear the mark while the caller already holds the lock.
    fn release(mut self, inner: &mut Inner) {
        inner.in_flight = inner.in_flight.saturating_sub(1);
        self.inner = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(mutex) = self.inner.take() {
            let mut inner = mutex.lock().unwrap_or_else(PoisonError::into_inner);
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
    }
}

/// Pages fetched from a running proxy's `GET /api/news`.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    http: Client,
    endpoint: Url,
}

impl HttpPageSource {
    /// `base` is the proxy root, e.g. `http://localhost:3001`.
    pub fn new(base: &Url) -> Result<Self, LoaderError> {
        let endpoint = base
            .join("api/news")
            .map_err(|e| LoaderError::Source(format!("invalid proxy URL {base}: {e}")))?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, request: &NewsQuery) -> Result<String, LoaderError> {
        let body = self
            .http
            .get(self.endpoint.clone())
            .query(request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}
