use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::key::validate_key;
use crate::revision::Revision;
use crate::traits::{check_write, BlobStore, PutOptions, PutReceipt, StoredBlob, UploadMode};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` and
/// cloned on read/write. Failures of a remote store can be simulated per key
/// with [`fail_gets_of`](Self::fail_gets_of),
/// [`fail_deletes_of`](Self::fail_deletes_of) and
/// [`fail_puts_of`](Self::fail_puts_of).
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    faults: RwLock<Faults>,
    put_count: AtomicU64,
}

#[derive(Default)]
struct Faults {
    gets: HashSet<String>,
    deletes: HashSet<String>,
    puts: HashSet<String>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            faults: RwLock::new(Faults::default()),
            put_count: AtomicU64::new(0),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.data.len() as u64)
            .sum()
    }

    /// Sorted list of all keys in the store.
    pub fn keys(&self) -> Vec<String> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of successful `put` calls since creation.
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::SeqCst)
    }

    /// Make every future read of `key` fail with `Unavailable`.
    pub fn fail_gets_of(&self, key: &str) {
        self.faults
            .write()
            .expect("lock poisoned")
            .gets
            .insert(key.to_string());
    }

    /// Make every future delete of `key` fail with `Unavailable`.
    pub fn fail_deletes_of(&self, key: &str) {
        self.faults
            .write()
            .expect("lock poisoned")
            .deletes
            .insert(key.to_string());
    }

    /// Make every future put of `key` fail with `Unavailable`.
    pub fn fail_puts_of(&self, key: &str) {
        self.faults
            .write()
            .expect("lock poisoned")
            .puts
            .insert(key.to_string());
    }

    /// Remove all injected failures.
    pub fn clear_faults(&self) {
        let mut faults = self.faults.write().expect("lock poisoned");
        faults.gets.clear();
        faults.deletes.clear();
        faults.puts.clear();
    }

    /// Remove all blobs from the store.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
        validate_key(key)?;
        if self.faults.read().expect("lock poisoned").puts.contains(key) {
            return Err(StoreError::Unavailable(format!("injected put failure for {key}")));
        }

        let mut map = self.blobs.write().expect("lock poisoned");
        check_write(key, map.get(key).map(|b| &b.revision), options)?;

        let revision = Revision::of(data);
        map.insert(
            key.to_string(),
            StoredBlob {
                key: key.to_string(),
                data: data.to_vec(),
                revision: revision.clone(),
            },
        );
        self.put_count.fetch_add(1, Ordering::SeqCst);

        Ok(PutReceipt {
            key: key.to_string(),
            locator: self.locator(key),
            revision,
            // Nothing sits in front of this store, so every write is
            // immediately visible.
            invalidated: options.invalidate,
        })
    }

    fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        validate_key(key)?;
        if self.faults.read().expect("lock poisoned").gets.contains(key) {
            return Err(StoreError::Unavailable(format!("injected get failure for {key}")));
        }
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.blobs.read().expect("lock poisoned").contains_key(key))
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        if self.faults.read().expect("lock poisoned").deletes.contains(key) {
            return Err(StoreError::Unavailable(format!(
                "injected delete failure for {key}"
            )));
        }
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn locator(&self, key: &str) -> String {
        format!("mem://{key}")
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
