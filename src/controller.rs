//! Orchestrates one collection: page loads against a [`PageFetcher`] and
//! reconciliation of confirmed mutations, exposing the visible sequence.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cursor::CursorStore;
use crate::error::Result;
use crate::event::MutationOutcome;
use crate::item::{CollectionKey, Item, ItemId, SortKeys};
use crate::listing::Listing;
use crate::reconcile::{MutationReconciler, Reconciled, ReconcileEvent};
use crate::service::{Page, PageFetcher, PageRequest};
use crate::sort::SortSpec;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// What happened to a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was appended; `merged` tail items found their place.
    Appended { items: usize, merged: usize },
    /// No request was issued: one is in flight or nothing is left to load.
    Skipped,
    /// The result arrived after the cursor, sort spec or request changed.
    Discarded,
}

/// Serializable view of a controller for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot {
    pub key: CollectionKey,
    pub spec: SortSpec,
    pub items: Vec<Item>,
    /// Number of leading items that form the sorted window.
    pub ordered: usize,
    pub cursor: Option<ItemId>,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

/// Client-side state for one collection key.
///
/// Owns the window and tail exclusively; shares the cursor map with other
/// controllers through a [`CursorStore`] handle. Dropping the controller
/// removes its cursor entry.
pub struct ListController {
    key: CollectionKey,
    listing: Listing,
    cursors: CursorStore,
    page_size: usize,
    /// Bumped on every reset so results of older requests can be recognised.
    generation: u64,
    in_flight: Option<PageRequest>,
    /// Ids mutated while `in_flight` was outstanding; the local copy wins over the page.
    touched: HashSet<ItemId>,
    needs_refetch: bool,
    /// Last transient failure, shown until dismissed or the next success.
    last_error: Option<String>,
}

impl ListController {
    pub fn new(key: CollectionKey, spec: SortSpec, page_size: usize, cursors: CursorStore) -> Self {
        cursors.init(&key);
        Self {
            key,
            listing: Listing::new(spec),
            cursors,
            page_size: page_size.max(1),
            generation: 0,
            in_flight: None,
            touched: HashSet::new(),
            needs_refetch: false,
            last_error: None,
        }
    }

    pub fn key(&self) -> &CollectionKey {
        &self.key
    }

    pub fn sort_spec(&self) -> &SortSpec {
        self.listing.spec()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn has_more(&self) -> bool {
        self.listing.has_more()
    }

    /// Whether a page request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn cursor(&self) -> Option<ItemId> {
        self.cursors.get(&self.key)
    }

    pub fn needs_refetch(&self) -> bool {
        self.needs_refetch
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// The sorted window followed by the unordered tail.
    pub fn visible_items(&self) -> Vec<&Item> {
        self.listing.visible()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            key: self.key.clone(),
            spec: *self.listing.spec(),
            items: self.visible_items().into_iter().cloned().collect(),
            ordered: self.listing.window().len(),
            cursor: self.cursor(),
            has_more: self.has_more(),
            loading: self.is_loading(),
            error: self.last_error.clone(),
        }
    }

    // ── Paging ──────────────────────────────────────────────────────────────

    /// Start loading the page after the cursor.
    ///
    /// Returns `None` while another request is outstanding or once the server
    /// reported no further pages.
    pub fn begin_fetch(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() {
            debug!(key = %self.key, "fetch already in flight");
            return None;
        }
        if self.listing.has_fetched() && !self.listing.has_more() {
            return None;
        }
        Some(self.issue(self.cursor()))
    }

    /// Start loading the first page again.
    ///
    /// The current window stays visible until the page arrives and replaces
    /// it; the tail is kept and merged with the new page. Any request already
    /// in flight is superseded.
    pub fn begin_first_page(&mut self) -> PageRequest {
        if self.in_flight.is_some() {
            debug!(key = %self.key, "superseding in-flight fetch");
        }
        self.generation += 1;
        info!(key = %self.key, tail = self.listing.tail().len(), "refetching first page");
        self.issue(None)
    }

    fn issue(&mut self, cursor: Option<ItemId>) -> PageRequest {
        let request = PageRequest {
            key: self.key.clone(),
            spec: *self.listing.spec(),
            cursor,
            limit: self.page_size,
            generation: self.generation,
        };
        self.in_flight = Some(request.clone());
        self.touched.clear();
        request
    }

    /// Apply the result of a request obtained from [`Self::begin_fetch`] or
    /// [`Self::begin_first_page`].
    ///
    /// Stale results are discarded. A failed fetch leaves the listing as it
    /// was so the load can be retried. Pages that break the ordering contract
    /// are rejected with an error. A request without a cursor replaces the
    /// window on success. Page items mutated locally since the request was
    /// issued are skipped.
    pub fn complete_fetch(
        &mut self,
        request: &PageRequest,
        result: Result<Page>,
    ) -> Result<FetchOutcome> {
        if self.in_flight.as_ref() != Some(request) {
            warn!(key = %self.key, generation = request.generation, "discarding superseded page");
            return Ok(FetchOutcome::Discarded);
        }
        self.in_flight = None;

        let touched = std::mem::take(&mut self.touched);
        let current = self.cursor();
        let first_page = request.cursor.is_none();
        if request.generation != self.generation || (!first_page && request.cursor != current) {
            warn!(
                key = %self.key,
                requested = ?request.cursor,
                current = ?current,
                "discarding page fetched for a stale cursor"
            );
            return Ok(FetchOutcome::Discarded);
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(key = %self.key, error = %e, "page fetch failed");
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let (items, skipped): (Vec<Item>, Vec<Item>) = page
            .items
            .into_iter()
            .partition(|item| !touched.contains(&item.id));
        if !skipped.is_empty() {
            debug!(key = %self.key, skipped = skipped.len(), "page items superseded by local mutations");
        }

        let applied = if first_page {
            self.listing.replace_window(&items, page.has_more, &touched)
        } else {
            self.listing.append_page(&items, page.has_more)
        };
        let merged = match applied {
            Ok(merged) => merged,
            Err(e) => {
                error!(key = %self.key, error = %e, "server page violates listing order");
                return Err(e);
            }
        };
        if first_page {
            self.needs_refetch = false;
        }
        self.cursors.set(&self.key, self.listing.boundary().cloned());
        self.last_error = None;
        debug!(
            key = %self.key,
            items = items.len(),
            merged,
            has_more = page.has_more,
            "page appended"
        );
        Ok(FetchOutcome::Appended {
            items: items.len(),
            merged,
        })
    }

    pub async fn load_first_page<F: PageFetcher + ?Sized>(&mut self, fetcher: &F) -> Result<FetchOutcome> {
        let request = self.begin_first_page();
        let result = fetcher.fetch_page(&request).await;
        self.complete_fetch(&request, result)
    }

    /// Load the page after the cursor. No-op while a request is in flight or
    /// when the server reported no more pages.
    pub async fn load_next_page<F: PageFetcher + ?Sized>(&mut self, fetcher: &F) -> Result<FetchOutcome> {
        let Some(request) = self.begin_fetch() else {
            return Ok(FetchOutcome::Skipped);
        };
        let result = fetcher.fetch_page(&request).await;
        self.complete_fetch(&request, result)
    }

    /// Keep loading until the server reports no more pages. Returns the
    /// number of pages appended.
    pub async fn load_all<F: PageFetcher + ?Sized>(&mut self, fetcher: &F) -> Result<usize> {
        let mut pages = 0;
        loop {
            match self.load_next_page(fetcher).await? {
                FetchOutcome::Appended { .. } => pages += 1,
                FetchOutcome::Discarded => continue,
                FetchOutcome::Skipped => return Ok(pages),
            }
        }
    }

    /// Run the first-page refetch requested by an earlier removal, if any.
    pub async fn refresh_if_needed<F: PageFetcher + ?Sized>(
        &mut self,
        fetcher: &F,
    ) -> Result<Option<FetchOutcome>> {
        if !self.needs_refetch {
            return Ok(None);
        }
        self.load_first_page(fetcher).await.map(Some)
    }

    /// Sort by `spec` from scratch: window, tail and cursor are discarded and
    /// any outstanding request becomes stale.
    pub fn change_sort_spec(&mut self, spec: SortSpec) {
        info!(
            key = %self.key,
            field = spec.field.label(),
            direction = ?spec.direction,
            "sort spec changed, resetting listing"
        );
        self.generation += 1;
        self.listing.reset(spec);
        self.cursors.reset(&self.key);
        self.in_flight = None;
        self.touched.clear();
        self.needs_refetch = false;
    }

    // ── Mutations ───────────────────────────────────────────────────────────

    fn apply_event(&mut self, event: ReconcileEvent) -> Reconciled {
        if self.in_flight.is_some() {
            self.touched.insert(event.id().clone());
        }
        let outcome = MutationReconciler::new(&mut self.listing, &self.cursors, &self.key).apply(event);
        if outcome.needs_refetch {
            info!(key = %self.key, "window emptied with pending tail, refetch required");
            self.needs_refetch = true;
        }
        outcome
    }

    pub fn apply_insert(&mut self, item: Item) -> Reconciled {
        self.apply_event(ReconcileEvent::Insert(item))
    }

    pub fn apply_rename(&mut self, item: &Item, new_keys: SortKeys) -> Reconciled {
        self.apply_event(ReconcileEvent::Rename(item.with_keys(new_keys)))
    }

    pub fn apply_remove(&mut self, ids: &[ItemId]) -> Reconciled {
        ids.iter().fold(Reconciled::default(), |acc, id| {
            acc.merge(self.apply_event(ReconcileEvent::Remove(id.clone())))
        })
    }

    /// Apply whatever a confirmed mutation means for this collection.
    pub fn apply_outcome(&mut self, outcome: &MutationOutcome) -> Reconciled {
        let events = outcome.events_for(&self.key);
        if events.is_empty() {
            return Reconciled::default();
        }
        debug!(key = %self.key, op = outcome.label(), events = events.len(), "applying outcome");
        events
            .into_iter()
            .fold(Reconciled::default(), |acc, event| acc.merge(self.apply_event(event)))
    }

    /// Remove `ids`, then refetch the first page if the window emptied.
    pub async fn apply_remove_and_refetch<F: PageFetcher + ?Sized>(
        &mut self,
        ids: &[ItemId],
        fetcher: &F,
    ) -> Result<Reconciled> {
        let outcome = self.apply_remove(ids);
        self.refresh_if_needed(fetcher).await?;
        Ok(outcome)
    }

    /// Explicit teardown; the cursor entry goes away with the controller.
    pub fn close(self) {
        debug!(key = %self.key, "closing listing");
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        self.cursors.destroy(&self.key);
    }
}
