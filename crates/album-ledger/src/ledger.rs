use std::collections::HashSet;
use std::sync::Arc;

use album_store::{BlobStore, Precondition, PutOptions, Revision, StoreError};
use album_types::PhotoRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document;
use crate::error::{LedgerError, LedgerResult};

/// Well-known key of the ledger document.
pub const DEFAULT_LEDGER_KEY: &str = "gallery/ledger.json";

/// Where and how the ledger is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub key: String,
    /// Ask caches in front of the store to drop the old document on save.
    pub invalidate_cache: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_LEDGER_KEY.to_string(),
            invalidate_cache: true,
        }
    }
}

/// Result of [`MetadataLedger::load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedLedger {
    pub records: Vec<PhotoRecord>,
    /// Revision of the document that was read; `None` if it did not exist.
    pub revision: Option<Revision>,
}

/// Result of a successful save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReceipt {
    pub revision: Revision,
    pub records: usize,
    /// `true` if the store confirmed the cache was cleared synchronously.
    /// When `false`, another session's next load may still see the previous
    /// document until the cache expires.
    pub cache_invalidated: bool,
}

/// Single-document persistence of the photo collection.
pub struct MetadataLedger {
    store: Arc<dyn BlobStore>,
    config: LedgerConfig,
}

impl MetadataLedger {
    pub fn new(store: Arc<dyn BlobStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Fetch and decode the ledger, bypassing any cache.
    ///
    /// A missing document is a first run and yields an empty collection. A
    /// document that exists but does not parse is an error; it is never
    /// treated as empty, since the next save would then wipe it.
    pub fn load(&self) -> LedgerResult<LoadedLedger> {
        let key = self.key();
        let blob = self
            .store
            .get_fresh(key)
            .map_err(|source| LedgerError::Load {
                key: key.to_string(),
                source,
            })?;

        let Some(blob) = blob else {
            info!(key, "no ledger found; starting empty");
            return Ok(LoadedLedger {
                records: Vec::new(),
                revision: None,
            });
        };

        let records = document::decode(&blob.data).map_err(|reason| LedgerError::Malformed {
            key: key.to_string(),
            reason,
        })?;
        info!(key, records = records.len(), revision = %blob.revision.short(), "ledger loaded");
        Ok(LoadedLedger {
            records,
            revision: Some(blob.revision),
        })
    }

    /// Overwrite the ledger with the full collection. Last writer wins:
    /// changes saved by another session since this one loaded are lost.
    pub fn save(&self, records: &[PhotoRecord]) -> LedgerResult<SaveReceipt> {
        self.save_if(records, Precondition::Any)
    }

    /// Overwrite the ledger only if it still matches `precondition`.
    ///
    /// Use `Precondition::from_observed(loaded.revision.as_ref())` to reject
    /// the save when another session wrote in between.
    pub fn save_if(
        &self,
        records: &[PhotoRecord],
        precondition: Precondition,
    ) -> LedgerResult<SaveReceipt> {
        let key = self.key();

        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(&record.id) {
                return Err(LedgerError::DuplicateId(record.id.clone()));
            }
        }

        let data =
            document::encode(records).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let options = PutOptions::overwrite()
            .with_invalidate(self.config.invalidate_cache)
            .with_precondition(precondition);

        let receipt = self
            .store
            .put(key, &data, &options)
            .map_err(|source| match source {
                StoreError::PreconditionFailed {
                    key,
                    expected,
                    actual,
                } => LedgerError::StaleRevision {
                    key,
                    expected,
                    actual,
                },
                source => LedgerError::Save {
                    key: key.to_string(),
                    source,
                },
            })?;

        if self.config.invalidate_cache && !receipt.invalidated {
            warn!(key, "cache invalidation not confirmed; other sessions may read a stale ledger");
        }
        debug!(key, records = records.len(), bytes = data.len(), revision = %receipt.revision.short(), "ledger saved");

        Ok(SaveReceipt {
            revision: receipt.revision,
            records: records.len(),
            cache_invalidated: receipt.invalidated,
        })
    }

    /// Current revision of the stored document, bypassing caches.
    pub fn current_revision(&self) -> LedgerResult<Option<Revision>> {
        let key = self.key();
        self.store
            .get_fresh(key)
            .map(|blob| blob.map(|b| b.revision))
            .map_err(|source| LedgerError::Load {
                key: key.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for MetadataLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataLedger")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use album_store::{CachedBlobStore, InMemoryBlobStore};
    use album_types::{Album, NaiveDate, PhotoId, TagSet};
    use proptest::prelude::*;

    fn record(id: &str, day: u32) -> PhotoRecord {
        PhotoRecord::new(
            PhotoId::new(id).unwrap(),
            format!("mem://photos/{id}"),
            format!("202401{day:02}_{id}.jpg"),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        )
    }

    fn ledger_on(store: Arc<dyn BlobStore>) -> MetadataLedger {
        MetadataLedger::new(store, LedgerConfig::default())
    }

    fn memory_ledger() -> (Arc<InMemoryBlobStore>, MetadataLedger) {
        let store = Arc::new(InMemoryBlobStore::new());
        let ledger = ledger_on(store.clone());
        (store, ledger)
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    #[test]
    fn first_run_loads_empty() {
        let (_store, ledger) = memory_ledger();
        let loaded = ledger.load().unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.revision.is_none());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let (store, ledger) = memory_ledger();
        store
            .put(DEFAULT_LEDGER_KEY, b"{not json", &PutOptions::overwrite())
            .unwrap();
        let err = ledger.load().unwrap_err();
        assert!(matches!(err, LedgerError::Malformed { .. }));
        assert!(err.is_load_failure());
    }

    #[test]
    fn load_bypasses_stale_cache() {
        let origin = Arc::new(InMemoryBlobStore::new());
        let cached = Arc::new(CachedBlobStore::new(origin.clone()));
        let ledger = ledger_on(cached.clone());

        ledger.save(&[record("a", 1)]).unwrap();
        // Warm the cache with the first document.
        cached.get(DEFAULT_LEDGER_KEY).unwrap();

        // Another writer goes straight to the origin.
        ledger_on(origin).save(&[record("a", 1), record("b", 2)]).unwrap();

        assert_eq!(ledger.load().unwrap().records.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    #[test]
    fn save_then_load() {
        let (_store, ledger) = memory_ledger();
        let records = vec![
            record("a", 1).with_tags(["x", "y"].into_iter().collect()),
            record("b", 2).with_album(Album::new("trips")).with_size(99),
        ];
        let receipt = ledger.save(&records).unwrap();
        assert_eq!(receipt.records, 2);

        let loaded = ledger.load().unwrap();
        assert_eq!(loaded.records, records);
        assert_eq!(loaded.revision, Some(receipt.revision));
    }

    #[test]
    fn save_is_full_overwrite() {
        let (_store, ledger) = memory_ledger();
        ledger.save(&[record("a", 1), record("b", 2)]).unwrap();
        ledger.save(&[record("c", 3)]).unwrap();
        let ids: Vec<String> = ledger
            .load()
            .unwrap()
            .records
            .iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn save_requests_cache_invalidation() {
        let origin = Arc::new(InMemoryBlobStore::new());
        let cached = Arc::new(CachedBlobStore::new(origin));
        let ledger = ledger_on(cached.clone());

        ledger.save(&[record("a", 1)]).unwrap();
        cached.get(DEFAULT_LEDGER_KEY).unwrap();
        let receipt = ledger.save(&[record("b", 2)]).unwrap();

        assert!(receipt.cache_invalidated);
        assert!(!cached.is_cached(DEFAULT_LEDGER_KEY));
    }

    #[test]
    fn save_without_invalidation_is_reported() {
        let origin = Arc::new(InMemoryBlobStore::new());
        let cached = Arc::new(CachedBlobStore::new(origin));
        let config = LedgerConfig {
            invalidate_cache: false,
            ..LedgerConfig::default()
        };
        let ledger = MetadataLedger::new(cached, config);
        assert!(!ledger.save(&[]).unwrap().cache_invalidated);
    }

    #[test]
    fn duplicate_ids_are_refused_before_io() {
        let (store, ledger) = memory_ledger();
        let err = ledger.save(&[record("a", 1), record("a", 2)]).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateId(_)));
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn store_failure_is_a_save_error() {
        let (store, ledger) = memory_ledger();
        store.fail_puts_of(DEFAULT_LEDGER_KEY);
        let err = ledger.save(&[record("a", 1)]).unwrap_err();
        assert!(matches!(err, LedgerError::Save { .. }));
        assert!(err.is_save_failure());
    }

    // -----------------------------------------------------------------------
    // Concurrent sessions
    // -----------------------------------------------------------------------

    #[test]
    fn unconditional_save_loses_concurrent_update() {
        let (store, _) = memory_ledger();
        ledger_on(store.clone())
            .save(&[record("y", 1), record("z", 2)])
            .unwrap();

        let s1 = ledger_on(store.clone());
        let s2 = ledger_on(store.clone());
        let mut view1 = s1.load().unwrap().records;
        let mut view2 = s2.load().unwrap().records;

        view1.push(record("x", 3));
        s1.save(&view1).unwrap();

        view2.retain(|r| r.id.as_str() != "y");
        s2.save(&view2).unwrap();

        let ids: Vec<String> = ledger_on(store)
            .load()
            .unwrap()
            .records
            .iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["z"]);
    }

    #[test]
    fn conditional_save_detects_concurrent_update() {
        let (store, _) = memory_ledger();
        let s1 = ledger_on(store.clone());
        let s2 = ledger_on(store.clone());
        let loaded1 = s1.load().unwrap();
        let loaded2 = s2.load().unwrap();

        s1.save_if(
            &[record("x", 1)],
            Precondition::from_observed(loaded1.revision.as_ref()),
        )
        .unwrap();

        let err = s2
            .save_if(
                &[record("w", 2)],
                Precondition::from_observed(loaded2.revision.as_ref()),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::StaleRevision { .. }));
        assert_eq!(s2.load().unwrap().records[0].id.as_str(), "x");
    }

    #[test]
    fn current_revision_tracks_saves() {
        let (_store, ledger) = memory_ledger();
        assert!(ledger.current_revision().unwrap().is_none());
        let receipt = ledger.save(&[]).unwrap();
        assert_eq!(ledger.current_revision().unwrap(), Some(receipt.revision));
    }

    // -----------------------------------------------------------------------
    // Round-trip property
    // -----------------------------------------------------------------------

    fn arb_record() -> impl Strategy<Value = PhotoRecord> {
        (
            "[a-z0-9]{1,12}",
            "[a-zA-Z0-9_. 上色]{0,20}",
            (1i32..=9999, 1u32..=12, 1u32..=28),
            prop::collection::vec("[a-z線搞]{1,6}", 0..4),
            prop::option::of("[a-z]{1,8}"),
            prop::option::of(any::<u64>()),
        )
            .prop_map(|(id, filename, (y, m, d), tags, album, size)| {
                let mut r = PhotoRecord::new(
                    PhotoId::new(id.clone()).unwrap(),
                    format!("https://cdn.example/{id}"),
                    filename,
                    NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                )
                .with_tags(tags.into_iter().collect::<TagSet>());
                if let Some(album) = album {
                    r = r.with_album(Album::new(album));
                }
                if let Some(size) = size {
                    r = r.with_size(size);
                }
                r
            })
    }

    fn arb_collection() -> impl Strategy<Value = Vec<PhotoRecord>> {
        prop::collection::vec(arb_record(), 0..12).prop_map(|mut records| {
            let mut seen = HashSet::new();
            records.retain(|r| seen.insert(r.id.clone()));
            records
        })
    }

    proptest! {
        #[test]
        fn load_after_save_returns_the_collection(records in arb_collection()) {
            let (_store, ledger) = memory_ledger();
            ledger.save(&records).unwrap();
            prop_assert_eq!(ledger.load().unwrap().records, records);
        }
    }
}
