use std::collections::BTreeMap;
use std::sync::Arc;

use album_gallery::{
    save_gallery, BatchOperation, BatchReport, GalleryError, GalleryStore, Snapshot, TagEdit,
};
use album_ledger::{LedgerError, MetadataLedger, SaveReceipt};
use album_query::Query;
use album_store::{BlobStore, InMemoryBlobStore};
use album_types::{captured_date_from_filename, Album, NaiveDate, PhotoId, PhotoRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AlbumConfig;
use crate::error::{SdkError, SdkResult};

/// One file an ingest batch could not add.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    pub filename: String,
    pub reason: String,
}

/// Outcome of [`PhotoAlbum::ingest_many`].
#[derive(Debug)]
pub struct IngestReport {
    pub added: Vec<PhotoRecord>,
    /// Files whose bytes are already in the album. Only reported when
    /// uploads are deduplicated.
    pub duplicates: Vec<IngestFailure>,
    pub failed: Vec<IngestFailure>,
    /// The single ledger save; `None` if nothing was added.
    pub save: Option<Result<SaveReceipt, LedgerError>>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.save.as_ref().map_or(true, Result::is_ok)
    }
}

/// A photo album session.
///
/// Opening a session loads the ledger once. All edits go to the in-memory
/// gallery first and are then saved as a full snapshot according to the
/// configured [`WritePolicy`].
///
/// If the store cannot be reached while opening, the session still opens
/// but stays unloaded: it shows an empty collection and refuses to save
/// until a later load succeeds.
///
/// [`WritePolicy`]: album_gallery::WritePolicy
pub struct PhotoAlbum {
    store: Arc<dyn BlobStore>,
    ledger: MetadataLedger,
    gallery: GalleryStore,
    config: AlbumConfig,
}

impl PhotoAlbum {
    pub fn open(store: Arc<dyn BlobStore>, config: AlbumConfig) -> SdkResult<Self> {
        config.validate()?;
        let ledger = MetadataLedger::new(store.clone(), config.ledger_config());
        let mut gallery = GalleryStore::new();
        match gallery.initialize(&ledger) {
            Ok(_) => info!(
                ledger = ledger.key(),
                records = gallery.len(),
                policy = %config.write_policy,
                "album opened"
            ),
            Err(GalleryError::Sync(e @ LedgerError::Load { .. })) => warn!(
                ledger = ledger.key(),
                error = %e,
                "ledger unavailable, album opened unloaded"
            ),
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            store,
            ledger,
            gallery,
            config,
        })
    }

    /// Open a session over a fresh in-memory store.
    pub fn in_memory() -> SdkResult<Self> {
        Self::open(Arc::new(InMemoryBlobStore::new()), AlbumConfig::default())
    }

    pub fn config(&self) -> &AlbumConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn ledger(&self) -> &MetadataLedger {
        &self.ledger
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    /// Returns `true` once the ledger has been loaded into this session.
    pub fn is_loaded(&self) -> bool {
        self.gallery.is_initialized()
    }

    /// Load the ledger if opening could not. Does nothing once loaded.
    pub fn ensure_loaded(&mut self) -> SdkResult<()> {
        if self.gallery.initialize(&self.ledger)? {
            info!(records = self.gallery.len(), "ledger loaded late");
        }
        Ok(())
    }

    // ---- Ingest ----

    /// Upload one image, add its record and save.
    ///
    /// The capture date comes from a `YYYYMMDD` filename prefix when there
    /// is one, otherwise `ingest_day`.
    pub fn ingest(
        &mut self,
        filename: &str,
        data: &[u8],
        ingest_day: NaiveDate,
    ) -> SdkResult<PhotoRecord> {
        self.ensure_loaded()?;
        let record = self.upload(filename, data, ingest_day)?;
        self.gallery.add(record.clone())?;
        self.save()?;
        Ok(record)
    }

    /// Upload several images and save once at the end.
    pub fn ingest_many<'a>(
        &mut self,
        files: impl IntoIterator<Item = (&'a str, &'a [u8])>,
        ingest_day: NaiveDate,
    ) -> IngestReport {
        let mut report = IngestReport {
            added: Vec::new(),
            duplicates: Vec::new(),
            failed: Vec::new(),
            save: None,
        };

        if let Err(e) = self.ensure_loaded() {
            warn!(error = %e, "ledger unavailable, nothing ingested");
            report.failed = files
                .into_iter()
                .map(|(filename, _)| IngestFailure {
                    filename: filename.to_string(),
                    reason: e.to_string(),
                })
                .collect();
            return report;
        }

        for (filename, data) in files {
            let record = match self.upload(filename, data, ingest_day) {
                Ok(record) => record,
                Err(e) => {
                    warn!(filename, error = %e, "upload failed");
                    report.failed.push(IngestFailure {
                        filename: filename.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            match self.gallery.add(record.clone()) {
                Ok(()) => report.added.push(record),
                Err(e) => {
                    debug!(filename, id = %record.id, "duplicate upload skipped");
                    report.duplicates.push(IngestFailure {
                        filename: filename.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.added.is_empty() {
            report.save = Some(save_gallery(
                &mut self.gallery,
                &self.ledger,
                self.config.write_policy,
            ));
        }
        report
    }

    fn upload(&self, filename: &str, data: &[u8], ingest_day: NaiveDate) -> SdkResult<PhotoRecord> {
        let receipt = self
            .store
            .upload(&self.config.image_prefix, data, self.config.upload_mode())
            .map_err(|source| SdkError::Upload {
                filename: filename.to_string(),
                source,
            })?;
        let id = PhotoId::new(receipt.key)?;
        let captured = captured_date_from_filename(filename, ingest_day);
        debug!(filename, %id, %captured, bytes = data.len(), "image uploaded");
        Ok(PhotoRecord::new(id, receipt.locator, filename, captured).with_size(data.len() as u64))
    }

    // ---- Read ----

    pub fn get(&self, id: &PhotoId) -> Option<&PhotoRecord> {
        self.gallery.get(id)
    }

    pub fn len(&self) -> usize {
        self.gallery.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gallery.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.gallery.snapshot()
    }

    pub fn query(&self, query: &Query) -> Vec<&PhotoRecord> {
        album_query::run(self.gallery.records(), query)
    }

    pub fn known_tags(&self) -> Vec<String> {
        self.gallery.known_tags()
    }

    pub fn albums(&self) -> BTreeMap<Album, usize> {
        album_query::albums(self.gallery.records())
    }

    // ---- Selection ----

    /// Mark `id` selected. Fails if the id is not in the album.
    pub fn select(&mut self, id: &PhotoId) -> SdkResult<()> {
        self.require(id)?;
        self.gallery.selection_mut().set(id, true);
        Ok(())
    }

    pub fn toggle(&mut self, id: &PhotoId) -> SdkResult<bool> {
        self.require(id)?;
        Ok(self.gallery.selection_mut().toggle(id))
    }

    /// Select every record the query returns. Returns how many matched.
    pub fn select_all(&mut self, query: &Query) -> usize {
        let ids: Vec<PhotoId> = self.query(query).into_iter().map(|r| r.id.clone()).collect();
        self.gallery.selection_mut().set_all(&ids, true);
        ids.len()
    }

    pub fn clear_selection(&mut self) {
        self.gallery.selection_mut().clear();
    }

    pub fn selected(&self) -> Vec<PhotoId> {
        self.gallery.selected().into_iter().collect()
    }

    fn require(&self, id: &PhotoId) -> SdkResult<()> {
        if self.gallery.contains(id) {
            Ok(())
        } else {
            Err(GalleryError::NotFound(id.clone()).into())
        }
    }

    // ---- Batch edits ----

    pub fn tag_selected(&mut self, edit: &TagEdit) -> BatchReport {
        let ids = self.selected();
        self.batch().edit_tags(&ids, edit)
    }

    pub fn move_selected(&mut self, album: &Album) -> BatchReport {
        let ids = self.selected();
        self.batch().assign_album(&ids, album)
    }

    pub fn delete_selected(&mut self) -> BatchReport {
        let ids = self.selected();
        self.batch().delete_many(&ids)
    }

    fn batch(&mut self) -> BatchOperation<'_> {
        BatchOperation::new(&mut self.gallery, &self.ledger, &*self.store)
            .with_policy(self.config.write_policy)
    }

    // ---- Sync ----

    /// Save the full collection under the configured write policy.
    pub fn save(&mut self) -> SdkResult<SaveReceipt> {
        self.ensure_loaded()?;
        Ok(save_gallery(
            &mut self.gallery,
            &self.ledger,
            self.config.write_policy,
        )?)
    }

    /// Discard in-memory state and load the ledger again.
    pub fn reload(&mut self) -> SdkResult<()> {
        self.gallery.reload(&self.ledger)?;
        Ok(())
    }
}
