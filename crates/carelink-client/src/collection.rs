//! Synchronized collection controller.
//!
//! One generic engine backs every list screen. It owns the loaded records,
//! the page cursor, the loading/error flags and the user's criteria, and it
//! derives the visible projection from them on read.
//!
//! All state sits behind one short-lived lock that is never held across a
//! request. Completions that arrive after [`SyncCollection::detach`], or
//! after a newer `refresh` started, are discarded.

use std::collections::HashMap;
use std::sync::Arc;

use carelink_core::{
    ApiError, ApiResult, Criteria, Method, Page, Pagination, Record, SortDirection, project,
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::executor::RequestExecutor;

/// A record type served by a paginated REST collection.
pub trait Resource: Record {
    type Create: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;

    /// Collection path, e.g. `/patients`.
    const PATH: &'static str;
    /// Index of the first page (some endpoints count from 0).
    const FIRST_PAGE: u32;
}

/// Where and how a collection is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEndpoint {
    pub path: String,
    pub first_page: u32,
    pub page_size: u32,
}

impl CollectionEndpoint {
    pub fn for_resource<R: Resource>(page_size: u32) -> Self {
        Self {
            path: R::PATH.to_string(),
            first_page: R::FIRST_PAGE,
            page_size,
        }
    }

    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, path_segment(id))
    }
}

/// Percent-encode a record id so it stays a single path segment.
pub fn path_segment(id: &str) -> String {
    match id {
        // Dot segments are normalized away by URL parsing.
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => urlencoding::encode(id).into_owned(),
    }
}

/// Pagination bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Next page to request.
    pub page_number: u32,
    pub page_size: u32,
    pub has_more: bool,
}

impl PageCursor {
    fn initial(endpoint: &CollectionEndpoint) -> Self {
        Self {
            page_number: endpoint.first_page,
            page_size: endpoint.page_size,
            has_more: true,
        }
    }

    /// Decide whether another page exists after `requested` came back with
    /// `received` items.
    fn has_more_after(
        &self,
        first_page: u32,
        requested: u32,
        received: usize,
        pagination: Option<&Pagination>,
    ) -> bool {
        if received == 0 || received < self.page_size as usize {
            return false;
        }
        let pages_loaded = requested.saturating_sub(first_page) + 1;
        match pagination.and_then(Pagination::page_count) {
            Some(total) => pages_loaded < total,
            None => true,
        }
    }
}

/// What a load call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was merged; `received` records came back.
    Applied { received: usize },
    /// Nothing was requested (already loading, exhausted or already loaded).
    Skipped,
    /// The response arrived for a superseded or detached controller.
    Discarded,
}

struct CollectionState<R: Record> {
    items: Vec<R>,
    criteria: Criteria<R>,
    cursor: PageCursor,
    loading: bool,
    loaded: bool,
    last_error: Option<ApiError>,
    generation: u64,
    detached: bool,
    visible: Option<Arc<[R]>>,
}

impl<R: Record> CollectionState<R> {
    fn invalidate(&mut self) {
        self.visible = None;
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    /// Append `incoming`, replacing any record whose id is already held.
    fn merge(&mut self, incoming: Vec<R>) {
        let mut index: HashMap<String, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().to_string(), i))
            .collect();
        for record in incoming {
            match index.get(record.id()) {
                Some(&i) => self.items[i] = record,
                None => {
                    index.insert(record.id().to_string(), self.items.len());
                    self.items.push(record);
                }
            }
        }
        self.invalidate();
    }

    fn replace_all(&mut self, incoming: Vec<R>) {
        self.items.clear();
        self.merge(incoming);
    }
}

pub struct SyncCollection<R: Resource> {
    executor: Arc<RequestExecutor>,
    endpoint: CollectionEndpoint,
    state: Mutex<CollectionState<R>>,
    revision: watch::Sender<u64>,
}

impl<R: Resource> SyncCollection<R> {
    pub fn new(executor: Arc<RequestExecutor>, endpoint: CollectionEndpoint) -> Self {
        let cursor = PageCursor::initial(&endpoint);
        let (revision, _) = watch::channel(0);
        Self {
            executor,
            endpoint,
            state: Mutex::new(CollectionState {
                items: Vec::new(),
                criteria: Criteria::default(),
                cursor,
                loading: false,
                loaded: false,
                last_error: None,
                generation: 0,
                detached: false,
                visible: None,
            }),
            revision,
        }
    }

    pub fn endpoint(&self) -> &CollectionEndpoint {
        &self.endpoint
    }

    /// Receiver whose value bumps after every observable state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn items(&self) -> Vec<R> {
        self.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Filtered and sorted view of the collection.
    ///
    /// Recomputed from scratch after any change to the records or the
    /// criteria, then cached until the next change.
    pub fn visible(&self) -> Arc<[R]> {
        let mut state = self.state.lock();
        if let Some(visible) = &state.visible {
            return visible.clone();
        }
        let visible: Arc<[R]> = project(&state.items, &state.criteria).into();
        state.visible = Some(visible.clone());
        visible
    }

    pub fn criteria(&self) -> Criteria<R> {
        self.state.lock().criteria.clone()
    }

    pub fn cursor(&self) -> PageCursor {
        self.state.lock().cursor
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().cursor.has_more
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.state.lock().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.update_state(|s| s.last_error = None);
    }

    /// Mark the owning screen as gone. Later completions are dropped.
    pub fn detach(&self) {
        self.state.lock().detached = true;
        debug!(path = %self.endpoint.path, "Collection detached");
    }

    pub fn set_criteria(&self, criteria: Criteria<R>) {
        self.update_criteria(|c| *c = criteria);
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.update_criteria(|c| c.search_text = text);
    }

    pub fn set_status_filter(&self, status: Option<R::Status>) {
        self.update_criteria(|c| c.status_filter = status);
    }

    pub fn set_preset(&self, preset: R::Preset) {
        self.update_criteria(|c| c.preset = preset);
    }

    pub fn set_sort(&self, field: R::SortField, direction: SortDirection) {
        self.update_criteria(|c| {
            c.sort_field = field;
            c.sort_direction = direction;
        });
    }

    pub fn toggle_sort_direction(&self) {
        self.update_criteria(|c| c.sort_direction = c.sort_direction.toggled());
    }

    /// Fetch the first page unless something has been loaded already.
    pub async fn load(&self) -> ApiResult<LoadOutcome> {
        if self.state.lock().loaded {
            return Ok(LoadOutcome::Skipped);
        }
        self.refresh().await
    }

    /// Re-fetch the first page and replace the whole collection with it.
    ///
    /// On failure the previous records stay in place.
    pub async fn refresh(&self) -> ApiResult<LoadOutcome> {
        let (generation, cursor) = {
            let mut state = self.state.lock();
            if state.detached {
                return Ok(LoadOutcome::Discarded);
            }
            state.generation += 1;
            state.loading = true;
            (state.generation, PageCursor::initial(&self.endpoint))
        };
        self.bump();

        let requested = cursor.page_number;
        let result = self.fetch_page(requested).await;

        let outcome = {
            let mut state = self.state.lock();
            if state.detached || state.generation != generation {
                debug!(path = %self.endpoint.path, "Discarding stale refresh");
                return Ok(LoadOutcome::Discarded);
            }
            state.loading = false;
            match result {
                Ok(page) => {
                    let received = page.items.len();
                    let has_more = cursor.has_more_after(
                        self.endpoint.first_page,
                        requested,
                        received,
                        page.pagination.as_ref(),
                    );
                    state.replace_all(page.items);
                    state.cursor = PageCursor {
                        page_number: requested + 1,
                        has_more,
                        ..cursor
                    };
                    state.loaded = true;
                    state.last_error = None;
                    Ok(LoadOutcome::Applied { received })
                }
                Err(e) => {
                    warn!(path = %self.endpoint.path, error = %e, "Refresh failed");
                    state.last_error = Some(e.clone());
                    Err(e)
                }
            }
        };
        self.bump();
        outcome
    }

    /// Fetch the next page and append it, de-duplicating by id.
    ///
    /// A no-op while another load is in flight or once the last page has
    /// been seen.
    pub async fn load_more(&self) -> ApiResult<LoadOutcome> {
        let (generation, cursor) = {
            let mut state = self.state.lock();
            if state.detached || state.loading || !state.cursor.has_more {
                return Ok(LoadOutcome::Skipped);
            }
            state.loading = true;
            (state.generation, state.cursor)
        };
        self.bump();

        let requested = cursor.page_number;
        let result = self.fetch_page(requested).await;

        let outcome = {
            let mut state = self.state.lock();
            if state.detached || state.generation != generation {
                debug!(path = %self.endpoint.path, "Discarding stale page");
                return Ok(LoadOutcome::Discarded);
            }
            state.loading = false;
            match result {
                Ok(page) => {
                    let received = page.items.len();
                    let has_more = cursor.has_more_after(
                        self.endpoint.first_page,
                        requested,
                        received,
                        page.pagination.as_ref(),
                    );
                    state.merge(page.items);
                    state.cursor = PageCursor {
                        page_number: requested + 1,
                        has_more,
                        ..cursor
                    };
                    state.loaded = true;
                    state.last_error = None;
                    Ok(LoadOutcome::Applied { received })
                }
                Err(e) => {
                    warn!(
                        path = %self.endpoint.path,
                        page = requested,
                        error = %e,
                        "Load more failed"
                    );
                    state.last_error = Some(e.clone());
                    Err(e)
                }
            }
        };
        self.bump();
        outcome
    }

    /// Create a record and put the server's copy at the front.
    pub async fn create(&self, request: &R::Create) -> ApiResult<R> {
        let result = self
            .executor
            .send_json(Method::Post, &self.endpoint.path, request, true)
            .await;
        self.apply_write(result, |state, record| {
            if let Some(i) = state.position(record.id()) {
                state.items.remove(i);
            }
            state.items.insert(0, record.clone());
        })
    }

    /// Replace a record with the server's updated copy, keeping its position.
    pub async fn update(&self, id: &str, request: &R::Update) -> ApiResult<R> {
        let path = self.endpoint.item_path(id);
        let result = self
            .executor
            .send_json(Method::Put, &path, request, true)
            .await;
        self.apply_write(result, replace_in_place)
    }

    pub async fn update_status(&self, id: &str, status: R::Status) -> ApiResult<R> {
        let path = format!("{}/status", self.endpoint.item_path(id));
        let result = self
            .executor
            .send_json(Method::Patch, &path, &json!({ "status": status }), true)
            .await;
        self.apply_write(result, replace_in_place)
    }

    /// Send a write to `path` whose reply is the record's new representation,
    /// and replace the held copy with it.
    pub async fn write_through<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<R> {
        let result = self.executor.send_json(method, path, body, true).await;
        self.apply_write(result, replace_in_place)
    }

    fn apply_write(
        &self,
        result: ApiResult<R>,
        place: impl FnOnce(&mut CollectionState<R>, &R),
    ) -> ApiResult<R> {
        {
            let mut state = self.state.lock();
            match &result {
                Ok(record) if !state.detached => {
                    place(&mut *state, record);
                    state.last_error = None;
                    state.invalidate();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %self.endpoint.path, error = %e, "Write failed");
                    state.last_error = Some(e.clone());
                }
            }
        }
        self.bump();
        result
    }

    async fn fetch_page(&self, page: u32) -> ApiResult<Page<R>> {
        let query = [
            ("page", page.to_string()),
            ("limit", self.endpoint.page_size.to_string()),
        ];
        self.executor.get_page(&self.endpoint.path, &query).await
    }

    fn update_criteria(&self, f: impl FnOnce(&mut Criteria<R>)) {
        self.update_state(|s| {
            f(&mut s.criteria);
            s.invalidate();
        });
    }

    fn update_state(&self, f: impl FnOnce(&mut CollectionState<R>)) {
        f(&mut *self.state.lock());
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

fn replace_in_place<R: Record>(state: &mut CollectionState<R>, record: &R) {
    if let Some(i) = state.position(record.id()) {
        state.items[i] = record.clone();
    }
}

impl<R: Resource> std::fmt::Debug for SyncCollection<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SyncCollection")
            .field("endpoint", &self.endpoint)
            .field("items", &state.items.len())
            .field("cursor", &state.cursor)
            .field("loading", &state.loading)
            .finish_non_exhaustive()
    }
}
