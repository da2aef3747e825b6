use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("photo id must not be empty")]
    EmptyId,

    #[error("invalid tag name {name:?}: {reason}")]
    InvalidTag { name: String, reason: String },

    #[error("invalid album name {name:?}: {reason}")]
    InvalidAlbum { name: String, reason: String },
}
