//! Ordered, lazily-paginated collection cache for file-manager listings.
//!
//! A [`ListController`] keeps a client-visible, sorted list consistent while
//! pages arrive from a keyset-paginated server and while confirmed
//! structural mutations (create, rename, move, copy, trash, restore, delete)
//! move items around the sort order.

pub mod config;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod event;
pub mod item;
pub mod listing;
pub mod memory;
pub mod reconcile;
pub mod replay;
pub mod service;
pub mod sort;

pub use controller::{FetchOutcome, ListController, ListSnapshot};
pub use cursor::CursorStore;
pub use error::{ListError, Result};
pub use event::MutationOutcome;
pub use item::{CollectionKey, Item, ItemId, Kind, SortKeys};
pub use reconcile::{Placement, Reconciled, ReconcileEvent};
pub use service::{Page, PageFetcher, PageRequest};
pub use sort::{compare, Direction, SortField, SortSpec};
