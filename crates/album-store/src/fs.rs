//! Directory-backed blob store.
//!
//! Keys map to relative paths below a root directory. Writes go through a
//! temporary file in the destination directory followed by a rename, so a
//! reader never observes a half-written blob.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::StoreResult;
use crate::key::validate_key;
use crate::revision::Revision;
use crate::traits::{check_write, BlobStore, PutOptions, PutReceipt, StoredBlob, UploadMode};

/// Blob store rooted at a local directory.
///
/// Conditional writes are checked and applied under an in-process lock.
/// Two processes writing the same key concurrently still race; the last
/// rename wins.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, c| path.join(c)))
    }

    fn read_path(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| std::io::Error::new(ErrorKind::Other, "write lock poisoned"))?;

        let current = Self::read_path(&path)?.map(|d| Revision::of(&d));
        check_write(key, current.as_ref(), options)?;

        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(key, bytes = data.len(), "blob written");
        Ok(PutReceipt {
            key: key.to_string(),
            locator: self.locator(key),
            revision: Revision::of(data),
            invalidated: options.invalidate,
        })
    }

    fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        let path = self.path_for(key)?;
        Ok(Self::read_path(&path)?.map(|data| StoredBlob {
            key: key.to_string(),
            revision: Revision::of(&data),
            data,
        }))
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn locator(&self, key: &str) -> String {
        key.split('/')
            .fold(self.root.clone(), |path, c| path.join(c))
            .display()
            .to_string()
    }
}
