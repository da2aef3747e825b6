use album_ledger::LedgerError;
use album_types::{PhotoId, TypeError};

use crate::batch::{BatchKind, ItemFailure};

/// Errors produced by gallery operations.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("photo not found: {0}")]
    NotFound(PhotoId),

    #[error("duplicate photo id: {0}")]
    DuplicateId(PhotoId),

    /// The ledger could not be read or written. The in-memory collection is
    /// kept as is.
    #[error("ledger sync failed: {0}")]
    Sync(#[from] LedgerError),

    #[error("{} finished with {} failed item(s): {}", .kind, .failed.len(), list_failures(.failed))]
    PartialBatch {
        kind: BatchKind,
        failed: Vec<ItemFailure>,
    },

    #[error(transparent)]
    Type(#[from] TypeError),
}

fn list_failures(failed: &[ItemFailure]) -> String {
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl GalleryError {
    /// The record ids this error is about, if any.
    pub fn affected_ids(&self) -> Vec<PhotoId> {
        match self {
            Self::NotFound(id) | Self::DuplicateId(id) => vec![id.clone()],
            Self::PartialBatch { failed, .. } => failed.iter().map(|f| f.id.clone()).collect(),
            Self::Sync(LedgerError::DuplicateId(id)) => vec![id.clone()],
            Self::Sync(_) | Self::Type(_) => Vec::new(),
        }
    }
}

/// Convenience type alias for gallery operations.
pub type GalleryResult<T> = Result<T, GalleryError>;
