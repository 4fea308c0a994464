use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, unique identity of a listed item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a paginated collection (a folder, a saved filter, the trash view).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionKey(String);

impl CollectionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CollectionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type of a listed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    File,
    Folder,
    Root,
}

impl Kind {
    /// Grouping rank used when folders are listed first.
    pub fn rank(self) -> u8 {
        match self {
            Kind::Root => 0,
            Kind::Folder => 1,
            Kind::File => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::File => "file",
            Kind::Folder => "folder",
            Kind::Root => "root",
        }
    }
}

/// The values an item can be sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKeys {
    pub name: String,
    /// Last modification, milliseconds since the Unix epoch.
    pub updated_at: i64,
    /// Size in bytes.
    pub size: u64,
}

impl SortKeys {
    pub fn new(name: impl Into<String>, updated_at: i64, size: u64) -> Self {
        Self {
            name: name.into(),
            updated_at,
            size,
        }
    }
}

/// A server-confirmed entry in a collection.
///
/// The id never changes; sort keys and kind may change across mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub sort_keys: SortKeys,
    pub kind: Kind,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, sort_keys: SortKeys, kind: Kind) -> Self {
        Self {
            id: id.into(),
            sort_keys,
            kind,
        }
    }

    /// Shorthand for a file whose only interesting key is its name.
    pub fn file(id: impl Into<ItemId>, name: &str) -> Self {
        Self::new(id, SortKeys::new(name, 0, 0), Kind::File)
    }

    /// Shorthand for a folder whose only interesting key is its name.
    pub fn folder(id: impl Into<ItemId>, name: &str) -> Self {
        Self::new(id, SortKeys::new(name, 0, 0), Kind::Folder)
    }

    /// Copy of this item carrying new sort keys.
    pub fn with_keys(&self, sort_keys: SortKeys) -> Self {
        Self {
            id: self.id.clone(),
            sort_keys,
            kind: self.kind,
        }
    }
}
