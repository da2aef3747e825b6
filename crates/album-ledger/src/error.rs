use album_store::{Precondition, Revision, StoreError};
use album_types::PhotoId;

/// Errors produced by ledger operations.
///
/// Load and save failures are separate variants: a failed save means the
/// in-memory collection is ahead of what is durable.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to load ledger {key}: {source}")]
    Load {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("ledger {key} is malformed: {reason}")]
    Malformed { key: String, reason: String },

    /// The session never loaded the ledger, so a save would overwrite
    /// content it has not seen.
    #[error("ledger {key} has not been loaded in this session")]
    NotLoaded { key: String },

    #[error("failed to save ledger {key}: {source}")]
    Save {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("ledger {key} changed since it was loaded: expected {expected}, found {}", display_actual(.actual))]
    StaleRevision {
        key: String,
        expected: Precondition,
        actual: Option<Revision>,
    },

    #[error("refusing to save ledger with duplicate photo id {0}")]
    DuplicateId(PhotoId),

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn display_actual(actual: &Option<Revision>) -> String {
    match actual {
        Some(rev) => rev.short(),
        None => "no ledger".to_string(),
    }
}

impl LedgerError {
    /// Returns `true` for failures that happened while reading the ledger.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::Malformed { .. } | Self::NotLoaded { .. }
        )
    }

    /// Returns `true` for failures that left a durability gap.
    pub fn is_save_failure(&self) -> bool {
        !self.is_load_failure()
    }
}

/// Convenience type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
