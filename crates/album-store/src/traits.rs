use std::sync::Arc;

use crate::error::StoreResult;
use crate::key::{content_key, unique_key};
use crate::revision::{Precondition, Revision};

/// A value read back from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub data: Vec<u8>,
    pub revision: Revision,
}

/// Options for [`BlobStore::put`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutOptions {
    /// Replace an existing value. When `false` the write is create-only.
    pub overwrite: bool,
    /// Ask any cache in front of the store to drop its copy of the key.
    pub invalidate: bool,
    /// Compare-and-swap condition checked against the current revision.
    pub precondition: Precondition,
}

impl PutOptions {
    /// Unconditional overwrite, no cache invalidation.
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            invalidate: false,
            precondition: Precondition::Any,
        }
    }

    /// Fail if the key already holds a value.
    pub fn create_only() -> Self {
        Self {
            overwrite: false,
            invalidate: false,
            precondition: Precondition::Any,
        }
    }

    pub fn with_invalidate(mut self, invalidate: bool) -> Self {
        self.invalidate = invalidate;
        self
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = precondition;
        self
    }
}

impl Default for PutOptions {
    fn default() -> Self {
        Self::overwrite()
    }
}

/// How [`BlobStore::upload`] assigns keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadMode {
    /// A new key for every upload, even of bytes already stored.
    #[default]
    Unique,
    /// Content-derived key; uploading stored bytes again returns the
    /// existing key without rewriting it.
    Deduplicate,
}

/// Outcome of a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutReceipt {
    pub key: String,
    /// Where the bytes can be fetched for display (URL or path).
    pub locator: String,
    pub revision: Revision,
    /// `true` only if a cache layer confirmed it dropped its copy
    /// synchronously. Readers may otherwise see the previous value until the
    /// cache expires.
    pub invalidated: bool,
}

/// Key-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - A write either stores all bytes under the key or leaves the previous
///   value untouched.
/// - `Precondition` checks and the write they guard happen under one lock
///   for in-process backends.
/// - Reads of a missing key return `Ok(None)`, never an error.
/// - All I/O errors are propagated, never silently ignored.
///
/// Calls are blocking and carry no timeout of their own; remote backends
/// must surface transport failures as [`StoreError::Unavailable`].
///
/// [`StoreError::Unavailable`]: crate::StoreError::Unavailable
pub trait BlobStore: Send + Sync {
    /// Write `data` under `key`.
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt>;

    /// Read the value under `key`, possibly from a cache.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>>;

    /// Read the value under `key`, bypassing any cache.
    ///
    /// Default implementation calls `get()`; cache layers override it.
    fn get_fresh(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        self.get(key)
    }

    /// Delete the value under `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Display locator for a key (URL or filesystem path).
    fn locator(&self, key: &str) -> String;

    /// Check whether a key exists at the origin, bypassing any cache.
    ///
    /// The default reads the whole value; backends override it with a
    /// cheaper lookup.
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_fresh(key)?.is_some())
    }

    /// Upload image bytes under a store-assigned key below `prefix`.
    fn upload(&self, prefix: &str, data: &[u8], mode: UploadMode) -> StoreResult<PutReceipt> {
        let key = match mode {
            UploadMode::Unique => unique_key(prefix)?,
            UploadMode::Deduplicate => {
                let key = content_key(prefix, data)?;
                if self.exists(&key)? {
                    return Ok(PutReceipt {
                        locator: self.locator(&key),
                        key,
                        revision: Revision::of(data),
                        invalidated: false,
                    });
                }
                key
            }
        };
        self.put(&key, data, &PutOptions::create_only())
    }
}

impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
        (**self).put(key, data, options)
    }

    fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        (**self).get(key)
    }

    fn get_fresh(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        (**self).get_fresh(key)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }

    fn locator(&self, key: &str) -> String {
        (**self).locator(key)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn upload(&self, prefix: &str, data: &[u8], mode: UploadMode) -> StoreResult<PutReceipt> {
        (**self).upload(prefix, data, mode)
    }
}

/// Check create-only and compare-and-swap rules for a write.
pub(crate) fn check_write(
    key: &str,
    current: Option<&Revision>,
    options: &PutOptions,
) -> StoreResult<()> {
    use crate::error::StoreError;

    if !options.overwrite && current.is_some() {
        return Err(StoreError::AlreadyExists(key.to_string()));
    }
    if !options.precondition.is_satisfied_by(current) {
        return Err(StoreError::PreconditionFailed {
            key: key.to_string(),
            expected: options.precondition.clone(),
            actual: current.cloned(),
        });
    }
    Ok(())
}
