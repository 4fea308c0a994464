//! Applies server-confirmed structural changes to a [`Listing`] while keeping
//! the window sorted and the cursor equal to the window's last item.

use std::cmp::Ordering;

use tracing::debug;

use crate::cursor::CursorStore;
use crate::item::{CollectionKey, Item, ItemId};
use crate::listing::{Listing, Location};
use crate::sort::compare;

/// A confirmed change to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// The item now exists in the collection (create, upload, copy arrival, restore).
    Insert(Item),
    /// The item's sort keys or kind changed; carries the post-mutation item.
    Rename(Item),
    /// The item left the collection (trash, delete, move out).
    Remove(ItemId),
}

impl ReconcileEvent {
    /// Id of the item the event concerns.
    pub fn id(&self) -> &ItemId {
        match self {
            ReconcileEvent::Insert(item) | ReconcileEvent::Rename(item) => &item.id,
            ReconcileEvent::Remove(id) => id,
        }
    }
}

/// Where an event left its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Spliced into the sorted window at this index.
    Window(usize),
    /// Appended to the unordered tail.
    Tail,
    Removed,
    /// The event did not touch any tracked item.
    #[default]
    Untracked,
}

/// Summary of one reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reconciled {
    pub placement: Placement,
    /// The window's last item changed and the cursor was rewritten.
    pub cursor_moved: bool,
    /// The window emptied while the tail still holds items; the first page
    /// must be fetched again before the tail can be trusted.
    pub needs_refetch: bool,
}

impl Reconciled {
    /// Fold the result of a later step into this one.
    pub fn merge(self, later: Reconciled) -> Reconciled {
        let placement = match later.placement {
            Placement::Untracked => self.placement,
            placement => placement,
        };
        Reconciled {
            placement,
            cursor_moved: self.cursor_moved || later.cursor_moved,
            needs_refetch: self.needs_refetch || later.needs_refetch,
        }
    }
}

/// Applies [`ReconcileEvent`]s for one collection key.
pub struct MutationReconciler<'a> {
    listing: &'a mut Listing,
    cursors: &'a CursorStore,
    key: &'a CollectionKey,
}

impl<'a> MutationReconciler<'a> {
    pub fn new(listing: &'a mut Listing, cursors: &'a CursorStore, key: &'a CollectionKey) -> Self {
        Self {
            listing,
            cursors,
            key,
        }
    }

    /// Apply one event and rewrite the cursor if the window boundary moved.
    pub fn apply(&mut self, event: ReconcileEvent) -> Reconciled {
        let before = self.listing.boundary().cloned();

        let mut outcome = match event {
            ReconcileEvent::Insert(item) => self.insert(item),
            ReconcileEvent::Rename(item) => self.rename(item),
            ReconcileEvent::Remove(id) => self.remove(&id),
        };

        let after = self.listing.boundary().cloned();
        if before != after {
            debug!(key = %self.key, from = ?before, to = ?after, "cursor moved");
            self.cursors.set(self.key, after);
            outcome.cursor_moved = true;
        }

        debug_assert!(
            self.listing.is_window_sorted(),
            "window lost sort order after reconciliation"
        );
        outcome
    }

    fn insert(&mut self, item: Item) -> Reconciled {
        if self.listing.locate(&item.id).is_some() {
            return self.rename(item);
        }

        let pos = self.listing.position_for(&item);
        let placement = if pos < self.listing.window().len() || self.listing.is_complete() {
            Placement::Window(self.listing.insert_into_window(item))
        } else {
            self.listing.push_to_tail(item);
            Placement::Tail
        };
        debug!(key = %self.key, ?placement, "insert reconciled");
        Reconciled {
            placement,
            ..Reconciled::default()
        }
    }

    fn rename(&mut self, item: Item) -> Reconciled {
        let boundary = self.listing.boundary_item().cloned();
        let Some((_, from)) = self.listing.take(&item.id) else {
            debug!(key = %self.key, id = %item.id, "rename of untracked item, inserting");
            return self.insert(item);
        };

        // The old boundary, taken before removal, marks how far server order
        // is known even when the renamed item was the boundary itself.
        let known = self.listing.is_complete()
            || boundary
                .as_ref()
                .is_some_and(|b| compare(&item, b, self.listing.spec()) != Ordering::Greater);

        let placement = if known {
            Placement::Window(self.listing.insert_into_window(item))
        } else {
            self.listing.push_to_tail(item);
            Placement::Tail
        };
        debug!(key = %self.key, ?from, ?placement, "rename reconciled");
        Reconciled {
            placement,
            ..Reconciled::default()
        }
    }

    fn remove(&mut self, id: &ItemId) -> Reconciled {
        let Some((_, from)) = self.listing.take(id) else {
            return Reconciled::default();
        };
        let needs_refetch = matches!(from, Location::Window(_))
            && self.listing.window().is_empty()
            && !self.listing.tail().is_empty();
        debug!(key = %self.key, %id, ?from, needs_refetch, "remove reconciled");
        Reconciled {
            placement: Placement::Removed,
            cursor_moved: false,
            needs_refetch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Kind, SortKeys};
    use crate::sort::{Direction, SortField, SortSpec};

    fn spec() -> SortSpec {
        SortSpec::new(SortField::Name, Direction::Ascending)
    }

    fn page(names: &[&str]) -> Vec<Item> {
        names.iter().map(|n| Item::file(*n, n)).collect()
    }

    struct Fixture {
        listing: Listing,
        cursors: CursorStore,
        key: CollectionKey,
    }

    impl Fixture {
        fn loaded(names: &[&str], has_more: bool) -> Self {
            let mut listing = Listing::new(spec());
            listing.append_page(&page(names), has_more).unwrap();
            let cursors = CursorStore::new();
            let key = CollectionKey::from("docs");
            cursors.set(&key, listing.boundary().cloned());
            Self {
                listing,
                cursors,
                key,
            }
        }

        fn apply(&mut self, event: ReconcileEvent) -> Reconciled {
            let outcome =
                MutationReconciler::new(&mut self.listing, &self.cursors, &self.key).apply(event);
            self.check_invariants();
            outcome
        }

        fn check_invariants(&self) {
            assert!(self.listing.is_window_sorted());
            assert_eq!(
                self.cursors.get(&self.key),
                self.listing.boundary().cloned()
            );
        }

        fn window(&self) -> Vec<&str> {
            self.listing
                .window()
                .ids()
                .iter()
                .map(|id| id.as_str())
                .collect()
        }

        fn tail(&self) -> Vec<&str> {
            self.listing
                .tail()
                .ids()
                .iter()
                .map(|id| id.as_str())
                .collect()
        }

        fn cursor(&self) -> Option<String> {
            self.cursors.get(&self.key).map(|id| id.to_string())
        }
    }

    #[test]
    fn ordered_insert_splices_before_cursor() {
        let mut fx = Fixture::loaded(&["a", "b", "d"], true);
        let out = fx.apply(ReconcileEvent::Insert(Item::file("c", "c")));
        assert_eq!(out.placement, Placement::Window(2));
        assert!(!out.cursor_moved);
        assert_eq!(fx.window(), vec!["a", "b", "c", "d"]);
        assert_eq!(fx.cursor().as_deref(), Some("d"));
    }

    #[test]
    fn unordered_insert_goes_to_tail_without_moving_cursor() {
        let mut fx = Fixture::loaded(&["a", "b"], true);
        let out = fx.apply(ReconcileEvent::Insert(Item::file("z", "z")));
        assert_eq!(out.placement, Placement::Tail);
        let visible: Vec<&str> = fx.listing.visible().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(visible, vec!["a", "b", "z"]);
        assert_eq!(fx.cursor().as_deref(), Some("b"));
    }

    #[test]
    fn insert_past_end_of_complete_listing_extends_window() {
        let mut fx = Fixture::loaded(&["a", "b"], false);
        let out = fx.apply(ReconcileEvent::Insert(Item::file("z", "z")));
        assert_eq!(out.placement, Placement::Window(2));
        assert!(out.cursor_moved);
        assert_eq!(fx.cursor().as_deref(), Some("z"));
    }

    #[test]
    fn insert_before_first_fetch_goes_to_tail() {
        let mut fx = Fixture {
            listing: Listing::new(spec()),
            cursors: CursorStore::new(),
            key: CollectionKey::from("docs"),
        };
        let out = fx.apply(ReconcileEvent::Insert(Item::file("a", "a")));
        assert_eq!(out.placement, Placement::Tail);
        assert_eq!(fx.cursor(), None);
    }

    #[test]
    fn insert_of_tracked_id_acts_as_rename() {
        let mut fx = Fixture::loaded(&["a", "b", "c"], true);
        let moved = Item::file("a", "bb");
        fx.apply(ReconcileEvent::Insert(moved));
        assert_eq!(fx.window(), vec!["b", "a", "c"]);
        assert_eq!(fx.listing.store().len(), 3);
    }

    #[test]
    fn cursor_item_rename_past_end_moves_to_tail() {
        let mut fx = Fixture::loaded(&["a", "b", "c"], true);
        let renamed = Item::file("c", "zzz");
        let out = fx.apply(ReconcileEvent::Rename(renamed));
        assert_eq!(out.placement, Placement::Tail);
        assert!(out.cursor_moved);
        assert_eq!(fx.window(), vec!["a", "b"]);
        assert_eq!(fx.tail(), vec!["c"]);
        assert_eq!(fx.cursor().as_deref(), Some("b"));
    }

    #[test]
    fn cursor_item_rename_to_earlier_key_shifts_cursor_left() {
        let mut fx = Fixture::loaded(&["a", "b", "c"], true);
        let out = fx.apply(ReconcileEvent::Rename(Item::file("c", "0")));
        assert_eq!(out.placement, Placement::Window(0));
        assert_eq!(fx.window(), vec!["c", "a", "b"]);
        assert_eq!(fx.cursor().as_deref(), Some("b"));
    }

    #[test]
    fn cursor_item_rename_within_own_slot_keeps_cursor() {
        let mut fx = Fixture::loaded(&["a", "b", "d"], true);
        let out = fx.apply(ReconcileEvent::Rename(Item::file("d", "c")));
        assert_eq!(out.placement, Placement::Window(2));
        assert!(!out.cursor_moved);
        assert_eq!(fx.cursor().as_deref(), Some("d"));
    }

    #[test]
    fn rename_within_window_resorts() {
        let mut fx = Fixture::loaded(&["a", "b", "c", "d"], true);
        fx.apply(ReconcileEvent::Rename(Item::file("a", "cc")));
        assert_eq!(fx.window(), vec!["b", "c", "a", "d"]);
        assert_eq!(fx.cursor().as_deref(), Some("d"));
    }

    #[test]
    fn rename_tail_item_into_window() {
        let mut fx = Fixture::loaded(&["a", "c"], true);
        fx.apply(ReconcileEvent::Insert(Item::file("z", "z")));
        let out = fx.apply(ReconcileEvent::Rename(Item::file("z", "b")));
        assert_eq!(out.placement, Placement::Window(1));
        assert_eq!(fx.window(), vec!["a", "z", "c"]);
        assert!(fx.tail().is_empty());
    }

    #[test]
    fn rename_tail_item_stays_in_tail_at_end() {
        let mut fx = Fixture::loaded(&["a"], true);
        fx.apply(ReconcileEvent::Insert(Item::file("x", "x")));
        fx.apply(ReconcileEvent::Insert(Item::file("y", "y")));
        fx.apply(ReconcileEvent::Rename(Item::file("x", "xx")));
        assert_eq!(fx.tail(), vec!["y", "x"]);
        assert_eq!(fx.listing.store().len(), 3);
    }

    #[test]
    fn rename_of_untracked_item_inserts() {
        let mut fx = Fixture::loaded(&["a", "c"], true);
        let out = fx.apply(ReconcileEvent::Rename(Item::file("b", "b")));
        assert_eq!(out.placement, Placement::Window(1));
        assert_eq!(fx.window(), vec!["a", "b", "c"]);
    }

    #[test]
    fn rename_changing_size_under_size_sort() {
        let size_spec = SortSpec::new(SortField::Size, Direction::Descending);
        let mut listing = Listing::new(size_spec);
        let sized = |id: &str, size: u64| {
            Item::new(id, SortKeys::new(id, 0, size), Kind::File)
        };
        listing
            .append_page(&[sized("big", 300), sized("mid", 200), sized("low", 100)], true)
            .unwrap();
        let cursors = CursorStore::new();
        let key = CollectionKey::from("k");
        cursors.set(&key, listing.boundary().cloned());

        let out = MutationReconciler::new(&mut listing, &cursors, &key)
            .apply(ReconcileEvent::Rename(sized("low", 999)));
        assert_eq!(out.placement, Placement::Window(0));
        assert_eq!(cursors.get(&key), Some(ItemId::from("mid")));
    }

    #[test]
    fn remove_cursor_item_moves_cursor_back() {
        let mut fx = Fixture::loaded(&["a", "b", "c"], true);
        let out = fx.apply(ReconcileEvent::Remove(ItemId::from("c")));
        assert_eq!(out.placement, Placement::Removed);
        assert!(out.cursor_moved);
        assert_eq!(fx.window(), vec!["a", "b"]);
        assert_eq!(fx.cursor().as_deref(), Some("b"));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut fx = Fixture::loaded(&["a", "b", "c"], true);
        fx.apply(ReconcileEvent::Remove(ItemId::from("b")));
        let window_once = fx.window().join(",");
        let out = fx.apply(ReconcileEvent::Remove(ItemId::from("b")));
        assert_eq!(out, Reconciled::default());
        assert_eq!(fx.window().join(","), window_once);
        assert_eq!(fx.cursor().as_deref(), Some("c"));
    }

    #[test]
    fn remove_last_window_item_with_tail_requests_refetch() {
        let mut fx = Fixture::loaded(&["a", "b"], true);
        fx.apply(ReconcileEvent::Insert(Item::file("z", "z")));
        let first = fx.apply(ReconcileEvent::Remove(ItemId::from("a")));
        assert!(!first.needs_refetch);
        let second = fx.apply(ReconcileEvent::Remove(ItemId::from("b")));
        assert!(second.needs_refetch);
        assert_eq!(fx.cursor(), None);
        assert_eq!(fx.tail(), vec!["z"]);
    }

    #[test]
    fn merge_keeps_latest_placement_and_ors_flags() {
        let first = Reconciled {
            placement: Placement::Removed,
            cursor_moved: true,
            needs_refetch: false,
        };
        let merged = first.merge(Reconciled::default());
        assert_eq!(merged.placement, Placement::Removed);
        assert!(merged.cursor_moved);
        let merged = merged.merge(Reconciled {
            placement: Placement::Tail,
            cursor_moved: false,
            needs_refetch: true,
        });
        assert_eq!(merged.placement, Placement::Tail);
        assert!(merged.cursor_moved && merged.needs_refetch);
    }

    #[test]
    fn remove_from_tail_never_requests_refetch() {
        let mut fx = Fixture::loaded(&["a"], true);
        fx.apply(ReconcileEvent::Insert(Item::file("y", "y")));
        fx.apply(ReconcileEvent::Insert(Item::file("z", "z")));
        let out = fx.apply(ReconcileEvent::Remove(ItemId::from("y")));
        assert!(!out.needs_refetch);
        assert!(!out.cursor_moved);
        assert_eq!(fx.tail(), vec!["z"]);
    }
}
