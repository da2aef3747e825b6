//! High-level SDK for the photo album.
//!
//! [`PhotoAlbum`] is the session object applications embed: it owns the
//! blob store handle, the metadata ledger and the session gallery, and
//! exposes ingest, query, selection and batch editing in one place.

pub mod album;
pub mod config;
pub mod error;

pub use album::{IngestFailure, IngestReport, PhotoAlbum};
pub use config::{AlbumConfig, CONFIG_FILE_NAME};
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use album_gallery::{BatchKind, BatchReport, ItemFailure, Snapshot, TagEdit, WritePolicy};
pub use album_ledger::SaveReceipt;
pub use album_query::{Query, SortKey};
pub use album_types::{Album, NaiveDate, PhotoId, PhotoRecord, TagSet};
