use std::fmt;

use album_ledger::{LedgerError, LedgerResult, MetadataLedger, SaveReceipt};
use album_store::{Precondition, Revision};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::GalleryStore;

/// How a save treats changes another session made since this one loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Overwrite unconditionally. A concurrent session's edits are lost.
    #[default]
    LastWriterWins,
    /// Only save if the ledger is still at the revision this session is
    /// based on; otherwise fail with a stale-revision error.
    RejectStale,
}

impl WritePolicy {
    pub fn precondition(&self, base: Option<&Revision>) -> Precondition {
        match self {
            Self::LastWriterWins => Precondition::Any,
            Self::RejectStale => Precondition::from_observed(base),
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWriterWins => f.write_str("last-writer-wins"),
            Self::RejectStale => f.write_str("reject-stale"),
        }
    }
}

/// Persist the whole collection and advance the gallery's base revision.
///
/// Refuses with [`LedgerError::NotLoaded`] until the gallery has loaded the
/// ledger at least once.
pub fn save_gallery(
    gallery: &mut GalleryStore,
    ledger: &MetadataLedger,
    policy: WritePolicy,
) -> LedgerResult<SaveReceipt> {
    if !gallery.is_initialized() {
        return Err(LedgerError::NotLoaded {
            key: ledger.key().to_string(),
        });
    }
    let precondition = policy.precondition(gallery.base_revision());
    debug!(%policy, %precondition, records = gallery.len(), "saving gallery");
    let receipt = ledger.save_if(gallery.records(), precondition)?;
    gallery.mark_saved(receipt.revision.clone());
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use album_ledger::LedgerConfig;
    use album_store::InMemoryBlobStore;
    use album_types::{PhotoId, PhotoRecord};
    use chrono::NaiveDate;

    use super::*;

    fn photo(s: &str) -> PhotoRecord {
        PhotoRecord::new(
            PhotoId::new(s).unwrap(),
            "u",
            "n.jpg",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    fn ids(ledger: &MetadataLedger) -> Vec<String> {
        ledger
            .load()
            .unwrap()
            .records
            .iter()
            .map(|r| r.id.to_string())
            .collect()
    }

    #[test]
    fn policy_preconditions() {
        let rev = Revision::of(b"x");
        assert_eq!(WritePolicy::LastWriterWins.precondition(Some(&rev)), Precondition::Any);
        assert_eq!(WritePolicy::RejectStale.precondition(None), Precondition::Absent);
        assert_eq!(
            WritePolicy::RejectStale.precondition(Some(&rev)),
            Precondition::Matches(rev.clone())
        );
    }

    #[test]
    fn save_advances_base_revision() {
        let ledger = MetadataLedger::new(Arc::new(InMemoryBlobStore::new()), LedgerConfig::default());
        let mut gallery = GalleryStore::new();
        gallery.initialize(&ledger).unwrap();
        gallery.add(photo("a")).unwrap();

        let first = save_gallery(&mut gallery, &ledger, WritePolicy::RejectStale).unwrap();
        assert_eq!(gallery.base_revision(), Some(&first.revision));

        gallery.add(photo("b")).unwrap();
        save_gallery(&mut gallery, &ledger, WritePolicy::RejectStale).unwrap();
        assert_eq!(ids(&ledger), vec!["a", "b"]);
    }

    #[test]
    fn unloaded_gallery_refuses_to_save() {
        let ledger = MetadataLedger::new(Arc::new(InMemoryBlobStore::new()), LedgerConfig::default());
        ledger.save(&[photo("kept")]).unwrap();

        let mut gallery = GalleryStore::new();
        gallery.add(photo("a")).unwrap();
        let err = save_gallery(&mut gallery, &ledger, WritePolicy::LastWriterWins).unwrap_err();
        assert!(matches!(err, LedgerError::NotLoaded { .. }));
        assert!(err.is_load_failure());
        assert_eq!(ids(&ledger), vec!["kept"]);
    }

    // ---- Concurrent sessions ----

    fn two_sessions() -> (MetadataLedger, GalleryStore, GalleryStore) {
        let ledger = MetadataLedger::new(Arc::new(InMemoryBlobStore::new()), LedgerConfig::default());
        ledger.save(&[photo("c1"), photo("y")]).unwrap();
        let mut s1 = GalleryStore::new();
        let mut s2 = GalleryStore::new();
        s1.initialize(&ledger).unwrap();
        s2.initialize(&ledger).unwrap();
        (ledger, s1, s2)
    }

    #[test]
    fn last_writer_wins_loses_concurrent_add() {
        let (ledger, mut s1, mut s2) = two_sessions();

        s1.add(photo("x")).unwrap();
        save_gallery(&mut s1, &ledger, WritePolicy::LastWriterWins).unwrap();

        s2.remove(&PhotoId::new("y").unwrap()).unwrap();
        save_gallery(&mut s2, &ledger, WritePolicy::LastWriterWins).unwrap();

        assert_eq!(ids(&ledger), vec!["c1"]);
    }

    #[test]
    fn reject_stale_detects_the_race() {
        let (ledger, mut s1, mut s2) = two_sessions();

        s1.add(photo("x")).unwrap();
        save_gallery(&mut s1, &ledger, WritePolicy::RejectStale).unwrap();

        s2.remove(&PhotoId::new("y").unwrap()).unwrap();
        let err = save_gallery(&mut s2, &ledger, WritePolicy::RejectStale).unwrap_err();
        assert!(matches!(err, LedgerError::StaleRevision { .. }));
        assert_eq!(ids(&ledger), vec!["c1", "y", "x"]);
        // the losing session keeps its in-memory edit
        assert_eq!(s2.len(), 1);
    }
}
