//! Client-side state of one paginated collection: the sorted window, the
//! unordered tail, and the identity map both of them index into.

pub mod store;
pub mod tail;
pub mod window;

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::Result;
use crate::item::{Item, ItemId};
use crate::sort::{compare, SortSpec};

pub use store::ItemStore;
pub use tail::UnorderedTail;
pub use window::PageWindow;

/// Where a tracked item currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Window(usize),
    Tail,
}

/// Window, tail and identity map for a single sort spec.
#[derive(Debug, Default)]
pub struct Listing {
    spec: SortSpec,
    store: ItemStore,
    window: PageWindow,
    tail: UnorderedTail,
    /// Whether at least one page has been appended since the last reset.
    fetched: bool,
}

impl Listing {
    pub fn new(spec: SortSpec) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }

    pub fn spec(&self) -> &SortSpec {
        &self.spec
    }

    pub fn window(&self) -> &PageWindow {
        &self.window
    }

    pub fn tail(&self) -> &UnorderedTail {
        &self.tail
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    pub fn locate(&self, id: &ItemId) -> Option<Location> {
        if let Some(idx) = self.window.index_of(id) {
            Some(Location::Window(idx))
        } else if self.tail.contains(id) {
            Some(Location::Tail)
        } else {
            None
        }
    }

    /// Id of the last window item: the pagination cursor.
    pub fn boundary(&self) -> Option<&ItemId> {
        self.window.last()
    }

    pub fn boundary_item(&self) -> Option<&Item> {
        self.window.last().and_then(|id| self.store.get(id))
    }

    /// The window followed by the tail.
    pub fn visible(&self) -> Vec<&Item> {
        self.window
            .ids()
            .iter()
            .chain(self.tail.ids())
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    /// Forget everything and adopt a new sort spec.
    pub fn reset(&mut self, spec: SortSpec) {
        self.spec = spec;
        self.store.clear();
        self.window.clear();
        self.tail.clear();
        self.fetched = false;
    }

    /// Swap the window for a freshly fetched first page. The page is
    /// validated before anything changes. Old window items missing from the
    /// page are dropped, except ids in `keep`, which move to the tail.
    pub fn replace_window(
        &mut self,
        page: &[Item],
        has_more: bool,
        keep: &HashSet<ItemId>,
    ) -> Result<usize> {
        let mut fresh = PageWindow::default();
        fresh.append(page, &self.spec, &mut self.store)?;
        let previous = std::mem::replace(&mut self.window, fresh);
        for id in previous.ids() {
            if self.window.contains(id) {
                continue;
            }
            if keep.contains(id) {
                self.tail.push(id.clone());
            } else {
                self.store.remove(id);
            }
        }
        Ok(self.page_arrived(page, has_more))
    }

    /// Append a fetched page, record `has_more`, then fold in any tail items
    /// whose position is now known. Returns how many tail items were merged.
    pub fn append_page(&mut self, page: &[Item], has_more: bool) -> Result<usize> {
        self.window.append(page, &self.spec, &mut self.store)?;
        Ok(self.page_arrived(page, has_more))
    }

    fn page_arrived(&mut self, page: &[Item], has_more: bool) -> usize {
        self.window.set_has_more(has_more);
        self.fetched = true;
        let page_ids: HashSet<&ItemId> = page.iter().map(|item| &item.id).collect();
        self.tail.retain(|id| !page_ids.contains(id));
        self.merge_tail()
    }

    fn merge_tail(&mut self) -> usize {
        let complete = self.is_complete();
        let boundary = self.boundary_item().cloned();
        let pending: Vec<ItemId> = self.tail.ids().to_vec();
        let mut merged = 0;

        for id in pending {
            let Some(item) = self.store.get(&id).cloned() else {
                continue;
            };
            let known = complete
                || boundary
                    .as_ref()
                    .is_some_and(|b| compare(&item, b, &self.spec) != Ordering::Greater);
            if known {
                self.tail.remove(&id);
                let pos = self.position_for(&item);
                self.window.splice_insert(id, pos);
                merged += 1;
            }
        }
        merged
    }

    /// Sorted index `item` would take in the window.
    pub fn position_for(&self, item: &Item) -> usize {
        self.window.position_for(item, &self.spec, &self.store)
    }

    /// Splice an item into the window at its sorted position.
    pub fn insert_into_window(&mut self, item: Item) -> usize {
        let pos = self.position_for(&item);
        self.window.splice_insert(item.id.clone(), pos);
        self.store.upsert(item);
        pos
    }

    /// Append to the tail, replacing the stored copy.
    pub fn push_to_tail(&mut self, item: Item) {
        self.tail.push(item.id.clone());
        self.store.upsert(item);
    }

    /// Remove an item from whichever sequence holds it.
    pub fn take(&mut self, id: &ItemId) -> Option<(Item, Location)> {
        let location = self.locate(id)?;
        match location {
            Location::Window(_) => {
                self.window.remove_by_id(id);
            }
            Location::Tail => {
                self.tail.remove(id);
            }
        }
        self.store.remove(id).map(|item| (item, location))
    }

    pub fn has_more(&self) -> bool {
        self.window.has_more()
    }

    pub fn has_fetched(&self) -> bool {
        self.fetched
    }

    /// Whether the window holds the entire collection, so every position is known.
    pub fn is_complete(&self) -> bool {
        self.fetched && !self.window.has_more()
    }

    pub fn is_window_sorted(&self) -> bool {
        self.window.is_sorted(&self.spec, &self.store)
    }
}
