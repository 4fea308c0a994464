use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::item::{CollectionKey, ItemId};

/// Per-collection pagination cursors.
///
/// Cloning yields another handle onto the same map. Each entry is created by
/// [`CursorStore::init`] when a controller opens its collection and removed by
/// [`CursorStore::destroy`] when it closes.
#[derive(Debug, Clone, Default)]
pub struct CursorStore {
    entries: Rc<RefCell<HashMap<CollectionKey, Option<ItemId>>>>,
}

impl CursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` with an unset cursor. An existing entry is reset.
    pub fn init(&self, key: &CollectionKey) {
        self.entries.borrow_mut().insert(key.clone(), None);
    }

    /// Record the id of the window's last item, or `None` for an empty window.
    pub fn set(&self, key: &CollectionKey, cursor: Option<ItemId>) {
        self.entries.borrow_mut().insert(key.clone(), cursor);
    }

    /// Current cursor; `None` if never set, reset, or unknown key.
    pub fn get(&self, key: &CollectionKey) -> Option<ItemId> {
        self.entries.borrow().get(key).cloned().flatten()
    }

    /// Clear the cursor for a full refetch, keeping the entry registered.
    pub fn reset(&self, key: &CollectionKey) {
        if let Some(cursor) = self.entries.borrow_mut().get_mut(key) {
            *cursor = None;
        }
    }

    pub fn destroy(&self, key: &CollectionKey) {
        self.entries.borrow_mut().remove(key);
    }

    pub fn contains(&self, key: &CollectionKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Number of live collection entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
