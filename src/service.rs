use async_trait::async_trait;

use crate::error::Result;
use crate::item::{CollectionKey, Item, ItemId};
use crate::sort::SortSpec;

/// Parameters of one keyset page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub key: CollectionKey,
    pub spec: SortSpec,
    /// Id of the last item already held; `None` requests the first page.
    pub cursor: Option<ItemId>,
    pub limit: usize,
    /// Listing generation the request was issued under; bumped on sort change.
    pub generation: u64,
}

/// One page of server results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Sorted by the request's spec, all strictly after the cursor item.
    pub items: Vec<Item>,
    pub has_more: bool,
}

/// Remote source of sorted pages.
#[async_trait(?Send)]
pub trait PageFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;
}
