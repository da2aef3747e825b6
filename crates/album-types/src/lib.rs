//! Foundation types for the photo album.
//!
//! Every other album crate depends on `album-types`. The types here enforce
//! the record invariants at construction time so that the ledger, gallery,
//! and query layers never have to re-check them.
//!
//! # Key Types
//!
//! - [`PhotoId`] -- opaque, non-empty identifier assigned by the blob store
//! - [`TagSet`] -- ordered, de-duplicated open set of tags
//! - [`Album`] -- album name that is never empty (falls back to the sentinel)
//! - [`PhotoRecord`] -- one managed photo and its metadata
//!
//! Capture dates are plain [`chrono::NaiveDate`] values; see
//! [`captured_date_from_filename`] for the ingest-time derivation rule.

pub mod album;
pub mod date;
pub mod error;
pub mod id;
pub mod names;
pub mod record;
pub mod tags;

pub use album::{Album, LEGACY_UNCLASSIFIED, UNCLASSIFIED};
pub use date::captured_date_from_filename;
pub use error::TypeError;
pub use id::PhotoId;
pub use names::{validate_album_name, validate_tag_name, MAX_NAME_LEN};
pub use record::PhotoRecord;
pub use tags::TagSet;

pub use chrono::NaiveDate;
