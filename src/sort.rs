use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Sort criteria for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Alphabetical (case-insensitive), default.
    #[default]
    Name,
    /// By modification time.
    UpdatedAt,
    /// By size in bytes.
    Size,
}

impl SortField {
    /// Parse a sort field from its config spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortField::Name),
            "updated_at" | "modified" => Some(SortField::UpdatedAt),
            "size" => Some(SortField::Size),
            _ => None,
        }
    }

    /// Get the display label for the field.
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::UpdatedAt => "Modified",
            SortField::Size => "Size",
        }
    }

    /// Cycle to the next sort field.
    pub fn next(&self) -> Self {
        match self {
            SortField::Name => SortField::Size,
            SortField::Size => SortField::UpdatedAt,
            SortField::UpdatedAt => SortField::Name,
        }
    }
}

/// Direction applied to the sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" | "ascending" => Some(Direction::Ascending),
            "desc" | "descending" => Some(Direction::Descending),
            _ => None,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// The single active ordering of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: Direction,
    /// Group folders (and roots) ahead of files, independent of direction.
    pub folders_first: bool,
}

impl SortSpec {
    pub fn new(field: SortField, direction: Direction) -> Self {
        Self {
            field,
            direction,
            folders_first: false,
        }
    }

    pub fn with_folders_first(mut self, folders_first: bool) -> Self {
        self.folders_first = folders_first;
        self
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortField::Name, Direction::Ascending).with_folders_first(true)
    }
}

/// Total order over items under `spec`.
///
/// Direction flips the field comparison only; equal field values always fall
/// back to ascending id so that the order is deterministic.
pub fn compare(a: &Item, b: &Item, spec: &SortSpec) -> Ordering {
    let grouped = if spec.folders_first {
        a.kind.rank().cmp(&b.kind.rank())
    } else {
        Ordering::Equal
    };

    grouped
        .then_with(|| {
            let by_field = compare_field(a, b, spec.field);
            match spec.direction {
                Direction::Ascending => by_field,
                Direction::Descending => by_field.reverse(),
            }
        })
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_field(a: &Item, b: &Item, field: SortField) -> Ordering {
    let (ka, kb) = (&a.sort_keys, &b.sort_keys);
    match field {
        SortField::Name => ka
            .name
            .to_lowercase()
            .cmp(&kb.name.to_lowercase())
            .then_with(|| ka.name.cmp(&kb.name)),
        SortField::UpdatedAt => ka.updated_at.cmp(&kb.updated_at),
        SortField::Size => ka.size.cmp(&kb.size),
    }
}

/// Whether `items` is strictly increasing under `spec`.
pub fn is_sorted(items: &[Item], spec: &SortSpec) -> bool {
    items
        .windows(2)
        .all(|pair| compare(&pair[0], &pair[1], spec) == Ordering::Less)
}
