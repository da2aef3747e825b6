use album_gallery::GalleryError;
use album_ledger::LedgerError;
use album_store::StoreError;
use album_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("upload of {filename} failed: {source}")]
    Upload {
        filename: String,
        #[source]
        source: StoreError,
    },

    #[error("gallery error: {0}")]
    Gallery(#[from] GalleryError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid name: {0}")]
    Type(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Returns `true` if the failure left unsaved changes in memory.
    pub fn is_durability_gap(&self) -> bool {
        match self {
            Self::Ledger(e) | Self::Gallery(GalleryError::Sync(e)) => e.is_save_failure(),
            _ => false,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
