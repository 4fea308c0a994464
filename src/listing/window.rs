use std::cmp::Ordering;

use crate::error::{ListError, Result};
use crate::item::{Item, ItemId};
use crate::listing::store::ItemStore;
use crate::sort::{compare, SortSpec};

/// The verified-sorted prefix of a collection, fetched page by page.
#[derive(Debug, Default)]
pub struct PageWindow {
    ids: Vec<ItemId>,
    /// Whether the server reported further pages after the last fetch.
    has_more: bool,
}

impl PageWindow {
    /// Append a server page that continues the window.
    ///
    /// The page must be strictly sorted, must not repeat an id already in the
    /// window, and must start after the current last item. On any violation
    /// nothing is appended.
    pub fn append(&mut self, page: &[Item], spec: &SortSpec, store: &mut ItemStore) -> Result<()> {
        for pair in page.windows(2) {
            if compare(&pair[0], &pair[1], spec) != Ordering::Less {
                return Err(ListError::UnsortedPage {
                    previous: pair[0].id.clone(),
                    next: pair[1].id.clone(),
                });
            }
        }
        if let Some(dup) = page.iter().find(|item| self.contains(&item.id)) {
            return Err(ListError::DuplicateItem(dup.id.clone()));
        }
        if let (Some(first), Some(last)) = (page.first(), self.last_item(store)) {
            if compare(first, last, spec) != Ordering::Greater {
                return Err(ListError::PageOutOfOrder {
                    last: last.id.clone(),
                    first: first.id.clone(),
                });
            }
        }

        for item in page {
            self.ids.push(item.id.clone());
            store.upsert(item.clone());
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn last(&self) -> Option<&ItemId> {
        self.ids.last()
    }

    fn last_item<'s>(&self, store: &'s ItemStore) -> Option<&'s Item> {
        self.last().and_then(|id| store.get(id))
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.iter().any(|w| w == id)
    }

    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.ids.iter().position(|w| w == id)
    }

    /// Index at which `item` belongs: every window item before it sorts less.
    pub fn position_for(&self, item: &Item, spec: &SortSpec, store: &ItemStore) -> usize {
        self.ids.partition_point(|id| {
            store
                .get(id)
                .is_some_and(|w| compare(w, item, spec) == Ordering::Less)
        })
    }

    pub fn splice_insert(&mut self, id: ItemId, index: usize) {
        let index = index.min(self.ids.len());
        self.ids.insert(index, id);
    }

    /// Remove an id, returning whether it was present.
    pub fn remove_by_id(&mut self, id: &ItemId) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.ids.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
    }

    /// Drop every id and forget `has_more`.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.has_more = false;
    }

    /// Whether every adjacent pair is strictly ordered.
    pub fn is_sorted(&self, spec: &SortSpec, store: &ItemStore) -> bool {
        self.ids.windows(2).all(|pair| {
            match (store.get(&pair[0]), store.get(&pair[1])) {
                (Some(a), Some(b)) => compare(a, b, spec) == Ordering::Less,
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::{Direction, SortField};

    fn spec() -> SortSpec {
        SortSpec::new(SortField::Name, Direction::Ascending)
    }

    fn page(names: &[&str]) -> Vec<Item> {
        names.iter().map(|n| Item::file(*n, n)).collect()
    }

    fn ids(window: &PageWindow) -> Vec<&str> {
        window.ids().iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn append_extends_window() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        window.append(&page(&["a", "b"]), &spec(), &mut store).unwrap();
        window.append(&page(&["c"]), &spec(), &mut store).unwrap();
        assert_eq!(ids(&window), vec!["a", "b", "c"]);
        assert_eq!(window.last(), Some(&ItemId::from("c")));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn append_rejects_unsorted_page() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        let err = window
            .append(&page(&["b", "a"]), &spec(), &mut store)
            .unwrap_err();
        assert!(matches!(err, ListError::UnsortedPage { .. }));
        assert!(window.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        window.append(&page(&["a", "b"]), &spec(), &mut store).unwrap();
        let dup = vec![Item::file("b", "zz")];
        let err = window.append(&dup, &spec(), &mut store).unwrap_err();
        assert!(matches!(err, ListError::DuplicateItem(_)));
        assert_eq!(ids(&window), vec!["a", "b"]);
        assert_eq!(store.get(&ItemId::from("b")).unwrap().sort_keys.name, "b");
    }

    #[test]
    fn append_rejects_page_before_boundary() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        window.append(&page(&["c", "d"]), &spec(), &mut store).unwrap();
        let err = window
            .append(&page(&["b"]), &spec(), &mut store)
            .unwrap_err();
        assert!(matches!(err, ListError::PageOutOfOrder { .. }));
    }

    #[test]
    fn append_empty_page_is_noop() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        window.append(&[], &spec(), &mut store).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn position_for_uses_binary_search() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        window
            .append(&page(&["a", "b", "d"]), &spec(), &mut store)
            .unwrap();
        let c = Item::file("c", "c");
        assert_eq!(window.position_for(&c, &spec(), &store), 2);
        let z = Item::file("z", "z");
        assert_eq!(window.position_for(&z, &spec(), &store), 3);
        let first = Item::file("0", "0");
        assert_eq!(window.position_for(&first, &spec(), &store), 0);
    }

    #[test]
    fn remove_by_id_reports_presence() {
        let mut store = ItemStore::default();
        let mut window = PageWindow::default();
        window.append(&page(&["a", "b"]), &spec(), &mut store).unwrap();
        assert!(window.remove_by_id(&ItemId::from("a")));
        assert!(!window.remove_by_id(&ItemId::from("a")));
        assert_eq!(ids(&window), vec!["b"]);
    }

    #[test]
    fn has_more_is_independent_of_contents() {
        let mut window = PageWindow::default();
        window.set_has_more(true);
        assert!(window.has_more());
        assert!(window.is_empty());
        window.clear();
        assert!(!window.has_more());
    }
}
