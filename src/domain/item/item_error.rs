//! Failures raised by the item service.

/// An error from the item service.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// No item has the requested id.
    #[error("Item not found with id {0}")]
    NotFound(i64),
    /// The repository failed.
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// The result of calling item service functions.
pub type ItemResult<T> = Result<T, ItemError>;
