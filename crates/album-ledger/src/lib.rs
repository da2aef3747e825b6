//! Metadata ledger for the photo album.
//!
//! The whole photo collection is persisted as one JSON document under a
//! well-known key of a [`BlobStore`](album_store::BlobStore). This crate owns
//! the read-modify-write protocol around that document:
//!
//! - [`MetadataLedger::load`] -- fetch and decode the document, bypassing
//!   caches; a missing document is an empty collection
//! - [`MetadataLedger::save`] -- full-snapshot overwrite, last writer wins
//! - [`MetadataLedger::save_if`] -- the same write guarded by a revision
//!   precondition, for callers that want to detect concurrent sessions
//!
//! The wire format lives in [`document`]; older documents missing optional
//! fields still load, and keys this version does not know are preserved.

pub mod document;
pub mod error;
pub mod ledger;

pub use document::{decode, encode, LedgerEntry};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{LedgerConfig, LoadedLedger, MetadataLedger, SaveReceipt, DEFAULT_LEDGER_KEY};
