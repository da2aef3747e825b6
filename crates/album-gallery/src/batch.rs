//! Batch mutations over a set of selected records.
//!
//! A batch is best effort, not a transaction: every id is attempted, a
//! failure on one id never stops the rest, and nothing is rolled back.
//! Each batch ends with exactly one ledger save of the full collection,
//! whatever the number of ids.

use std::collections::HashSet;
use std::fmt;

use album_ledger::{LedgerError, MetadataLedger, SaveReceipt};
use album_store::BlobStore;
use album_types::{Album, PhotoId, TagSet};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GalleryError, GalleryResult};
use crate::store::GalleryStore;
use crate::sync::{save_gallery, WritePolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchKind {
    ApplyTags,
    AssignAlbum,
    DeleteMany,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApplyTags => f.write_str("apply-tags"),
            Self::AssignAlbum => f.write_str("assign-album"),
            Self::DeleteMany => f.write_str("delete-many"),
        }
    }
}

/// How a tag batch changes each record's tag set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagEdit {
    /// Replace the tag set.
    Replace(TagSet),
    /// Add these tags, keeping the existing ones.
    Add(TagSet),
    /// Remove these tags if present.
    Remove(TagSet),
}

impl TagEdit {
    fn apply(&self, current: &TagSet) -> TagSet {
        match self {
            Self::Replace(tags) => tags.clone(),
            Self::Add(tags) => {
                let mut next = current.clone();
                next.extend_from(tags);
                next
            }
            Self::Remove(tags) => {
                let mut next = current.clone();
                next.remove_all(tags);
                next
            }
        }
    }
}

/// One id the batch could not process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: PhotoId,
    pub reason: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

/// Per-id outcome of a batch plus the outcome of its single save.
#[derive(Debug)]
pub struct BatchReport {
    pub kind: BatchKind,
    /// Ids the mutation was applied to.
    pub succeeded: Vec<PhotoId>,
    /// Ids that were not in the gallery and were skipped.
    pub missing: Vec<PhotoId>,
    /// Ids left unchanged because a remote call failed.
    pub failed: Vec<ItemFailure>,
    /// The ledger save issued after every id was attempted. An error here
    /// means the in-memory gallery is ahead of the ledger.
    pub save: Result<SaveReceipt, LedgerError>,
}

impl BatchReport {
    /// Returns `true` if no item failed and the save succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.save.is_ok()
    }

    pub fn failed_ids(&self) -> Vec<PhotoId> {
        self.failed.iter().map(|f| f.id.clone()).collect()
    }

    /// Collapse the report into a single result.
    ///
    /// A failed save takes precedence over item failures since it means
    /// even the successful items are not durable.
    pub fn ensure_complete(self) -> GalleryResult<SaveReceipt> {
        let receipt = self.save?;
        if !self.failed.is_empty() {
            return Err(GalleryError::PartialBatch {
                kind: self.kind,
                failed: self.failed,
            });
        }
        Ok(receipt)
    }
}

#[derive(Default)]
struct Outcomes {
    succeeded: Vec<PhotoId>,
    missing: Vec<PhotoId>,
    failed: Vec<ItemFailure>,
}

/// Applies one mutation kind to a set of ids, then saves once.
pub struct BatchOperation<'a> {
    gallery: &'a mut GalleryStore,
    ledger: &'a MetadataLedger,
    blobs: &'a dyn BlobStore,
    policy: WritePolicy,
}

impl<'a> BatchOperation<'a> {
    pub fn new(
        gallery: &'a mut GalleryStore,
        ledger: &'a MetadataLedger,
        blobs: &'a dyn BlobStore,
    ) -> Self {
        Self {
            gallery,
            ledger,
            blobs,
            policy: WritePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the tag set of every id present in the gallery.
    pub fn apply_tags(&mut self, ids: &[PhotoId], tags: &TagSet) -> BatchReport {
        self.edit_tags(ids, &TagEdit::Replace(tags.clone()))
    }

    pub fn edit_tags(&mut self, ids: &[PhotoId], edit: &TagEdit) -> BatchReport {
        let mut outcomes = Outcomes::default();
        for id in dedup(ids) {
            let Some(record) = self.gallery.get(id) else {
                outcomes.missing.push(id.clone());
                continue;
            };
            let next = edit.apply(&record.tags);
            match self.gallery.update_tags(id, next) {
                Ok(()) => outcomes.succeeded.push(id.clone()),
                Err(_) => outcomes.missing.push(id.clone()),
            }
        }
        self.finish(BatchKind::ApplyTags, outcomes)
    }

    /// Move every id present in the gallery to `album`.
    pub fn assign_album(&mut self, ids: &[PhotoId], album: &Album) -> BatchReport {
        let mut outcomes = Outcomes::default();
        for id in dedup(ids) {
            match self.gallery.set_album(id, album.clone()) {
                Ok(()) => outcomes.succeeded.push(id.clone()),
                Err(_) => outcomes.missing.push(id.clone()),
            }
        }
        self.finish(BatchKind::AssignAlbum, outcomes)
    }

    /// Delete the image blob and then the record for every id.
    ///
    /// If the blob delete fails the record stays in the gallery and the id
    /// is reported as failed. A blob that is already gone counts as
    /// deleted.
    pub fn delete_many(&mut self, ids: &[PhotoId]) -> BatchReport {
        let mut outcomes = Outcomes::default();
        for id in dedup(ids) {
            if !self.gallery.contains(id) {
                outcomes.missing.push(id.clone());
                continue;
            }
            match self.blobs.delete(id.as_str()) {
                Ok(existed) => {
                    if !existed {
                        debug!(%id, "image blob already absent");
                    }
                    match self.gallery.remove(id) {
                        Ok(_) => outcomes.succeeded.push(id.clone()),
                        Err(_) => outcomes.missing.push(id.clone()),
                    }
                }
                Err(e) => {
                    warn!(%id, error = %e, "image delete failed; keeping record");
                    outcomes.failed.push(ItemFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        self.finish(BatchKind::DeleteMany, outcomes)
    }

    fn finish(&mut self, kind: BatchKind, outcomes: Outcomes) -> BatchReport {
        let report = BatchReport {
            kind,
            succeeded: outcomes.succeeded,
            missing: outcomes.missing,
            failed: outcomes.failed,
            save: save_gallery(self.gallery, self.ledger, self.policy),
        };
        match &report.save {
            Ok(receipt) => info!(
                kind = %report.kind,
                succeeded = report.succeeded.len(),
                missing = report.missing.len(),
                failed = report.failed.len(),
                revision = %receipt.revision.short(),
                "batch saved"
            ),
            Err(e) => warn!(kind = %report.kind, error = %e, "batch save failed; ledger is behind the gallery"),
        }
        report
    }
}

fn dedup(ids: &[PhotoId]) -> impl Iterator<Item = &PhotoId> {
    let mut seen = HashSet::new();
    ids.iter().filter(move |id| seen.insert(*id))
}
