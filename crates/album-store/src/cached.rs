//! Read-through cache in front of another blob store.
//!
//! Models the CDN/HTTP cache that typically fronts a hosted blob store:
//! `get` answers from the cache once a key has been read, so a plain read
//! after a write can return the previous bytes. Writers clear the cached
//! copy by setting [`PutOptions::invalidate`]; readers that must see the
//! latest value use [`BlobStore::get_fresh`], the equivalent of a
//! cache-busting request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::debug;

use crate::error::StoreResult;
use crate::traits::{BlobStore, PutOptions, PutReceipt, StoredBlob, UploadMode};

/// A [`BlobStore`] wrapper that caches reads.
pub struct CachedBlobStore<S> {
    inner: S,
    cache: RwLock<HashMap<String, StoredBlob>>,
    hits: AtomicU64,
}

impl<S: BlobStore> CachedBlobStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
        }
    }

    /// The origin store behind the cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of reads answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Returns `true` if the cache holds a copy of `key`.
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.read().expect("lock poisoned").contains_key(key)
    }

    fn evict(&self, key: &str) {
        self.cache.write().expect("lock poisoned").remove(key);
    }
}

impl<S: BlobStore> BlobStore for CachedBlobStore<S> {
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
        let mut receipt = self.inner.put(key, data, options)?;
        if options.invalidate {
            self.evict(key);
            debug!(key, "cache invalidated");
        }
        receipt.invalidated = options.invalidate;
        Ok(receipt)
    }

    fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        if let Some(hit) = self.cache.read().expect("lock poisoned").get(key) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            return Ok(Some(hit.clone()));
        }
        let fetched = self.inner.get(key)?;
        if let Some(blob) = &fetched {
            self.cache
                .write()
                .expect("lock poisoned")
                .insert(key.to_string(), blob.clone());
        }
        Ok(fetched)
    }

    fn get_fresh(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        self.inner.get_fresh(key)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let existed = self.inner.delete(key)?;
        self.evict(key);
        Ok(existed)
    }

    fn locator(&self, key: &str) -> String {
        self.inner.locator(key)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key)
    }

    fn upload(&self, prefix: &str, data: &[u8], mode: UploadMode) -> StoreResult<PutReceipt> {
        self.inner.upload(prefix, data, mode)
    }
}

impl<S> std::fmt::Debug for CachedBlobStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("CachedBlobStore")
            .field("cached_keys", &cached)
            .field("hits", &self.hits.load(Ordering::SeqCst))
            .finish()
    }
}
