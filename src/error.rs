use thiserror::Error;

use crate::item::ItemId;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, ListError>;

/// Listing error types.
#[derive(Debug, Error)]
pub enum ListError {
    /// A page fetch failed; the listing is unchanged and the load may be retried.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// A mutation collaborator rejected the request.
    #[error("Mutation failed: {0}")]
    Mutation(String),

    /// A fetched page was not internally sorted under the active sort spec.
    #[error("Page is not sorted: {previous} precedes {next}")]
    UnsortedPage { previous: ItemId, next: ItemId },

    /// An item id was already tracked by the window.
    #[error("Duplicate item in window: {0}")]
    DuplicateItem(ItemId),

    /// A fetched page does not start after the current window boundary.
    #[error("Page does not follow window: {first} sorts before {last}")]
    PageOutOfOrder { last: ItemId, first: ItemId },

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed replay script.
    #[error("Script error: {0}")]
    Script(String),

    /// I/O errors from reading config or script files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ListError {
    /// Whether the error signals a broken caller contract rather than a runtime failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ListError::UnsortedPage { .. }
                | ListError::DuplicateItem(_)
                | ListError::PageOutOfOrder { .. }
        )
    }

    /// Whether the operation can simply be retried by the user.
    pub fn is_transient(&self) -> bool {
        matches!(self, ListError::Fetch(_))
    }
}
