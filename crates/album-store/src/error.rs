use crate::revision::{Precondition, Revision};

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is not a valid relative blob path.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// A create-only write found an existing value.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// A conditional write found a different revision than expected.
    #[error("precondition failed for {key}: expected {expected}, found {}", display_actual(.actual))]
    PreconditionFailed {
        key: String,
        expected: Precondition,
        actual: Option<Revision>,
    },

    /// The backend could not be reached or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_actual(actual: &Option<Revision>) -> String {
    match actual {
        Some(rev) => rev.short(),
        None => "no blob".to_string(),
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
