//! Key-addressed blob storage for the photo album.
//!
//! The album keeps two kinds of data in the same store: image bytes, under
//! store-assigned keys, and the metadata ledger, a single JSON document under
//! a well-known key. The store never interprets either; it is a plain
//! key → bytes map with last-write-wins semantics plus an optional
//! compare-and-swap precondition on writes.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- directory-backed store with atomic writes
//! - [`CachedBlobStore`] -- read-through cache in front of another store,
//!   modelling a CDN that must be invalidated or bypassed
//!
//! # Design Rules
//!
//! 1. Keys are relative, `/`-separated paths; see [`validate_key`].
//! 2. Every stored value carries a [`Revision`] derived from its bytes.
//! 3. Writes may state a [`Precondition`]; the default is unconditional.
//! 4. Every upload gets a fresh key unless the caller asks for
//!    [`UploadMode::Deduplicate`], which maps identical bytes to one key.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod cached;
pub mod error;
pub mod fs;
pub mod key;
pub mod memory;
pub mod revision;
pub mod traits;

pub use cached::CachedBlobStore;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use key::{content_key, unique_key, validate_key};
pub use memory::InMemoryBlobStore;
pub use revision::{Precondition, Revision};
pub use traits::{BlobStore, PutOptions, PutReceipt, StoredBlob, UploadMode};
