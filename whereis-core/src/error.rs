use std::fmt::Display;

use thiserror::Error;

use crate::item::ItemId;

/// Error type for item store operations.
#[derive(Debug, Error)]
pub enum ItemStoreError {
    /// A required field is missing or empty, or an import payload is malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation addressed an item id that is not in the collection.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// A required read or write against the store or filesystem failed.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl ItemStoreError {
    pub(crate) fn persistence(context: &str, err: impl Display) -> Self {
        ItemStoreError::Persistence(format!("{context}: {err}"))
    }
}

pub type Result<T, E = ItemStoreError> = std::result::Result<T, E>;
