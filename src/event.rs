use serde::{Deserialize, Serialize};

use crate::item::{CollectionKey, Item, ItemId};
use crate::reconcile::ReconcileEvent;

/// Server-confirmed result of a structural mutation.
///
/// Only successful, authoritative results are represented; a failed mutation
/// never reaches the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created { into: CollectionKey, item: Item },
    /// An upload finished and the file is now listed.
    Uploaded { into: CollectionKey, item: Item },
    /// A copy arrived at its destination; the source is untouched.
    Copied { into: CollectionKey, item: Item },
    Renamed { within: CollectionKey, item: Item },
    Moved {
        from: CollectionKey,
        to: CollectionKey,
        item: Item,
    },
    Trashed { from: CollectionKey, id: ItemId },
    Restored { into: CollectionKey, item: Item },
    /// Permanent deletion.
    Deleted { from: CollectionKey, id: ItemId },
}

impl MutationOutcome {
    /// Reconcile events this outcome implies for collection `key`.
    pub fn events_for(&self, key: &CollectionKey) -> Vec<ReconcileEvent> {
        match self {
            MutationOutcome::Created { into, item }
            | MutationOutcome::Uploaded { into, item }
            | MutationOutcome::Copied { into, item }
            | MutationOutcome::Restored { into, item } => {
                if into == key {
                    vec![ReconcileEvent::Insert(item.clone())]
                } else {
                    Vec::new()
                }
            }
            MutationOutcome::Renamed { within, item } => {
                if within == key {
                    vec![ReconcileEvent::Rename(item.clone())]
                } else {
                    Vec::new()
                }
            }
            MutationOutcome::Moved { from, to, item } => {
                if from == key && to == key {
                    vec![ReconcileEvent::Rename(item.clone())]
                } else if from == key {
                    vec![ReconcileEvent::Remove(item.id.clone())]
                } else if to == key {
                    vec![ReconcileEvent::Insert(item.clone())]
                } else {
                    Vec::new()
                }
            }
            MutationOutcome::Trashed { from, id } | MutationOutcome::Deleted { from, id } => {
                if from == key {
                    vec![ReconcileEvent::Remove(id.clone())]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Short verb for status messages.
    pub fn label(&self) -> &'static str {
        match self {
            MutationOutcome::Created { .. } => "created",
            MutationOutcome::Uploaded { .. } => "uploaded",
            MutationOutcome::Copied { .. } => "copied",
            MutationOutcome::Renamed { .. } => "renamed",
            MutationOutcome::Moved { .. } => "moved",
            MutationOutcome::Trashed { .. } => "trashed",
            MutationOutcome::Restored { .. } => "restored",
            MutationOutcome::Deleted { .. } => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> CollectionKey {
        CollectionKey::from("docs")
    }

    fn photos() -> CollectionKey {
        CollectionKey::from("photos")
    }

    #[test]
    fn create_inserts_into_target_only() {
        let outcome = MutationOutcome::Created {
            into: docs(),
            item: Item::file("f1", "a.txt"),
        };
        assert_eq!(
            outcome.events_for(&docs()),
            vec![ReconcileEvent::Insert(Item::file("f1", "a.txt"))]
        );
        assert!(outcome.events_for(&photos()).is_empty());
    }

    #[test]
    fn move_removes_from_source_and_inserts_into_destination() {
        let item = Item::file("f1", "a.txt");
        let outcome = MutationOutcome::Moved {
            from: docs(),
            to: photos(),
            item: item.clone(),
        };
        assert_eq!(
            outcome.events_for(&docs()),
            vec![ReconcileEvent::Remove(ItemId::from("f1"))]
        );
        assert_eq!(
            outcome.events_for(&photos()),
            vec![ReconcileEvent::Insert(item)]
        );
    }

    #[test]
    fn move_within_same_collection_is_rename() {
        let item = Item::file("f1", "b.txt");
        let outcome = MutationOutcome::Moved {
            from: docs(),
            to: docs(),
            item: item.clone(),
        };
        assert_eq!(
            outcome.events_for(&docs()),
            vec![ReconcileEvent::Rename(item)]
        );
    }

    #[test]
    fn copy_never_removes_from_source() {
        let outcome = MutationOutcome::Copied {
            into: photos(),
            item: Item::file("f2", "a.txt"),
        };
        assert!(outcome.events_for(&docs()).is_empty());
        assert_eq!(outcome.events_for(&photos()).len(), 1);
    }

    #[test]
    fn trash_and_delete_remove() {
        for outcome in [
            MutationOutcome::Trashed {
                from: docs(),
                id: ItemId::from("f1"),
            },
            MutationOutcome::Deleted {
                from: docs(),
                id: ItemId::from("f1"),
            },
        ] {
            assert_eq!(
                outcome.events_for(&docs()),
                vec![ReconcileEvent::Remove(ItemId::from("f1"))]
            );
        }
    }

    #[test]
    fn outcome_serializes_with_op_tag() {
        let outcome = MutationOutcome::Trashed {
            from: docs(),
            id: ItemId::from("f1"),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["op"], "trashed");
        assert_eq!(json["from"], "docs");
    }
}
