use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::Arc;

use album_ledger::MetadataLedger;
use album_store::Revision;
use album_types::{Album, PhotoId, PhotoRecord, TagSet};
use tracing::{debug, info};

use crate::error::{GalleryError, GalleryResult};
use crate::selection::SelectionState;

/// Immutable, order-preserving copy of the collection.
///
/// Cloning a snapshot is cheap; mutating the gallery afterwards never
/// changes a snapshot already handed out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot(Arc<[PhotoRecord]>);

impl Snapshot {
    pub fn records(&self) -> &[PhotoRecord] {
        &self.0
    }
}

impl Deref for Snapshot {
    type Target = [PhotoRecord];

    fn deref(&self) -> &[PhotoRecord] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a PhotoRecord;
    type IntoIter = std::slice::Iter<'a, PhotoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The session's in-memory photo collection.
///
/// Records keep insertion order. Ids are unique at all times. Apart from
/// [`initialize`](Self::initialize) and [`reload`](Self::reload) nothing
/// here touches the ledger; callers persist with
/// [`save_gallery`](crate::save_gallery) after mutating.
#[derive(Debug, Default)]
pub struct GalleryStore {
    records: Vec<PhotoRecord>,
    selection: SelectionState,
    base_revision: Option<Revision>,
    initialized: bool,
}

impl GalleryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger into the gallery, once per session.
    ///
    /// Returns `Ok(false)` without touching the ledger if the gallery is
    /// already initialized. A failed load leaves the gallery uninitialized
    /// and its contents untouched, so the call can be retried.
    pub fn initialize(&mut self, ledger: &MetadataLedger) -> GalleryResult<bool> {
        if self.initialized {
            debug!("gallery already initialized");
            return Ok(false);
        }
        self.load_from(ledger)?;
        self.initialized = true;
        Ok(true)
    }

    /// Replace the collection with the ledger's current content.
    ///
    /// Unsaved in-memory changes are discarded. Selections of ids that are
    /// no longer present are dropped. On failure nothing changes.
    pub fn reload(&mut self, ledger: &MetadataLedger) -> GalleryResult<()> {
        self.load_from(ledger)?;
        self.initialized = true;
        Ok(())
    }

    fn load_from(&mut self, ledger: &MetadataLedger) -> GalleryResult<()> {
        let loaded = ledger.load()?;
        self.records = loaded.records;
        self.base_revision = loaded.revision;
        let records = &self.records;
        self.selection
            .retain(|id| records.iter().any(|r| &r.id == id));
        info!(records = self.records.len(), "gallery loaded");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Revision of the ledger document this session's state is based on.
    /// `None` if the session started from an empty (absent) ledger.
    pub fn base_revision(&self) -> Option<&Revision> {
        self.base_revision.as_ref()
    }

    /// Record that the current collection is now durable at `revision`.
    pub fn mark_saved(&mut self, revision: Revision) {
        self.base_revision = Some(revision);
    }

    // ---- Mutation ----

    pub fn add(&mut self, record: PhotoRecord) -> GalleryResult<()> {
        if self.contains(&record.id) {
            return Err(GalleryError::DuplicateId(record.id));
        }
        debug!(id = %record.id, "record added");
        self.records.push(record);
        Ok(())
    }

    /// Remove a record and its selection entry.
    pub fn remove(&mut self, id: &PhotoId) -> GalleryResult<PhotoRecord> {
        let index = self.position(id)?;
        self.selection.forget(id);
        debug!(%id, "record removed");
        Ok(self.records.remove(index))
    }

    /// Replace the tag set of a record.
    pub fn update_tags(&mut self, id: &PhotoId, tags: TagSet) -> GalleryResult<()> {
        let index = self.position(id)?;
        self.records[index].tags = tags;
        Ok(())
    }

    pub fn set_album(&mut self, id: &PhotoId, album: Album) -> GalleryResult<()> {
        let index = self.position(id)?;
        self.records[index].album = album;
        Ok(())
    }

    fn position(&self, id: &PhotoId) -> GalleryResult<usize> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| GalleryError::NotFound(id.clone()))
    }

    // ---- Read ----

    pub fn get(&self, id: &PhotoId) -> Option<&PhotoRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &PhotoId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrowed view of the records in collection order.
    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::from(self.records.as_slice()))
    }

    /// Tag suggestions: every tag currently in use.
    pub fn known_tags(&self) -> Vec<String> {
        album_query::known_tags(&self.records)
    }

    // ---- Selection ----

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    /// Selected ids that are still in the collection.
    pub fn selected(&self) -> BTreeSet<PhotoId> {
        self.selection
            .marked()
            .filter(|id| self.contains(id))
            .cloned()
            .collect()
    }
}
