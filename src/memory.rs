//! In-memory authoritative backend.
//!
//! Serves keyset pages and performs mutations the way a remote file service
//! would, returning canonical items. Used by the replay tool and by tests.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{ListError, Result};
use crate::event::MutationOutcome;
use crate::item::{CollectionKey, Item, ItemId, Kind, SortKeys};
use crate::service::{Page, PageFetcher, PageRequest};
use crate::sort::compare;

/// First timestamp handed out by the backend clock (ms since epoch).
const EPOCH_MS: i64 = 1_700_000_000_000;

#[derive(Debug)]
pub struct MemoryBackend {
    collections: HashMap<CollectionKey, Vec<Item>>,
    /// Trashed items with the collection they came from.
    trash: HashMap<ItemId, (CollectionKey, Item)>,
    next_id: u64,
    clock: i64,
    pending_failures: Cell<u32>,
    fetches: Cell<usize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            collections: HashMap::new(),
            trash: HashMap::new(),
            next_id: 1,
            clock: EPOCH_MS,
            pending_failures: Cell::new(0),
            fetches: Cell::new(0),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place items into a collection as-is, without producing outcomes.
    pub fn seed(&mut self, key: &CollectionKey, items: impl IntoIterator<Item = Item>) {
        self.collections
            .entry(key.clone())
            .or_default()
            .extend(items);
    }

    /// Make the next `n` page fetches fail.
    pub fn fail_next_fetches(&self, n: u32) {
        self.pending_failures.set(n);
    }

    /// Number of fetch attempts served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub fn len(&self, key: &CollectionKey) -> usize {
        self.collections.get(key).map_or(0, Vec::len)
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.locate(id)
            .and_then(|(key, idx)| self.collections.get(&key).map(|items| &items[idx]))
    }

    pub fn create(&mut self, into: &CollectionKey, name: &str, kind: Kind) -> MutationOutcome {
        let item = self.mint(name, 0, kind);
        self.seed(into, [item.clone()]);
        MutationOutcome::Created {
            into: into.clone(),
            item,
        }
    }

    pub fn upload(&mut self, into: &CollectionKey, name: &str, size: u64) -> MutationOutcome {
        let item = self.mint(name, size, Kind::File);
        self.seed(into, [item.clone()]);
        MutationOutcome::Uploaded {
            into: into.clone(),
            item,
        }
    }

    pub fn rename(&mut self, id: &ItemId, name: &str) -> Result<MutationOutcome> {
        let updated_at = self.tick();
        let (within, idx) = self.require(id)?;
        let item = self.item_mut(&within, idx)?;
        item.sort_keys.name = name.to_string();
        item.sort_keys.updated_at = updated_at;
        let item = item.clone();
        Ok(MutationOutcome::Renamed { within, item })
    }

    pub fn move_item(&mut self, id: &ItemId, to: &CollectionKey) -> Result<MutationOutcome> {
        let (from, idx) = self.require(id)?;
        let item = self.detach(&from, idx)?;
        self.seed(to, [item.clone()]);
        Ok(MutationOutcome::Moved {
            from,
            to: to.clone(),
            item,
        })
    }

    pub fn copy(&mut self, id: &ItemId, into: &CollectionKey) -> Result<MutationOutcome> {
        let source = self
            .get(id)
            .cloned()
            .ok_or_else(|| ListError::Mutation(format!("no item {}", id)))?;
        let item = self.mint(&source.sort_keys.name, source.sort_keys.size, source.kind);
        self.seed(into, [item.clone()]);
        Ok(MutationOutcome::Copied {
            into: into.clone(),
            item,
        })
    }

    pub fn trash(&mut self, id: &ItemId) -> Result<MutationOutcome> {
        let (from, idx) = self.require(id)?;
        let item = self.detach(&from, idx)?;
        self.trash.insert(id.clone(), (from.clone(), item));
        Ok(MutationOutcome::Trashed {
            from,
            id: id.clone(),
        })
    }

    pub fn restore(&mut self, id: &ItemId) -> Result<MutationOutcome> {
        let (into, item) = self
            .trash
            .remove(id)
            .ok_or_else(|| ListError::Mutation(format!("{} is not in the trash", id)))?;
        self.seed(&into, [item.clone()]);
        Ok(MutationOutcome::Restored { into, item })
    }

    /// Permanently delete a live or trashed item.
    pub fn delete(&mut self, id: &ItemId) -> Result<MutationOutcome> {
        if let Some((from, _)) = self.trash.remove(id) {
            return Ok(MutationOutcome::Deleted {
                from,
                id: id.clone(),
            });
        }
        let (from, idx) = self.require(id)?;
        self.detach(&from, idx)?;
        Ok(MutationOutcome::Deleted {
            from,
            id: id.clone(),
        })
    }

    fn mint(&mut self, name: &str, size: u64, kind: Kind) -> Item {
        let id = ItemId::new(format!("n{}", self.next_id));
        self.next_id += 1;
        let updated_at = self.tick();
        Item::new(id, SortKeys::new(name, updated_at, size), kind)
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1_000;
        self.clock
    }

    fn locate(&self, id: &ItemId) -> Option<(CollectionKey, usize)> {
        self.collections.iter().find_map(|(key, items)| {
            items
                .iter()
                .position(|item| &item.id == id)
                .map(|idx| (key.clone(), idx))
        })
    }

    fn require(&self, id: &ItemId) -> Result<(CollectionKey, usize)> {
        self.locate(id)
            .ok_or_else(|| ListError::Mutation(format!("no item {}", id)))
    }

    fn item_mut(&mut self, key: &CollectionKey, idx: usize) -> Result<&mut Item> {
        self.collections
            .get_mut(key)
            .and_then(|items| items.get_mut(idx))
            .ok_or_else(|| ListError::Mutation(format!("stale index into {}", key)))
    }

    fn detach(&mut self, key: &CollectionKey, idx: usize) -> Result<Item> {
        let items = self
            .collections
            .get_mut(key)
            .ok_or_else(|| ListError::Mutation(format!("no collection {}", key)))?;
        if idx >= items.len() {
            return Err(ListError::Mutation(format!("stale index into {}", key)));
        }
        Ok(items.remove(idx))
    }
}

#[async_trait(?Send)]
impl PageFetcher for MemoryBackend {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        self.fetches.set(self.fetches.get() + 1);
        let failures = self.pending_failures.get();
        if failures > 0 {
            self.pending_failures.set(failures - 1);
            return Err(ListError::Fetch(format!(
                "{} unavailable (injected failure)",
                request.key
            )));
        }

        let mut sorted = self
            .collections
            .get(&request.key)
            .cloned()
            .unwrap_or_default();
        sorted.sort_by(|a, b| compare(a, b, &request.spec));

        let start = match &request.cursor {
            None => 0,
            Some(cursor) => {
                let anchor = sorted
                    .iter()
                    .find(|item| &item.id == cursor)
                    .cloned()
                    .ok_or_else(|| {
                        ListError::Fetch(format!("cursor {} is not in {}", cursor, request.key))
                    })?;
                sorted.partition_point(|item| {
                    compare(item, &anchor, &request.spec) != Ordering::Greater
                })
            }
        };

        let rest = &sorted[start..];
        let take = rest.len().min(request.limit);
        Ok(Page {
            items: rest[..take].to_vec(),
            has_more: rest.len() > take,
        })
    }
}
