use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::album::Album;
use crate::id::PhotoId;
use crate::tags::TagSet;

/// One managed photo.
///
/// `id` and `captured_date` are fixed at creation. Tags and album are the
/// editable metadata. `extra` holds keys this version does not understand
/// but read from the ledger, so they survive a load/save cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub locator: String,
    pub filename: String,
    pub captured_date: NaiveDate,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub album: Album,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PhotoRecord {
    /// Create an untagged, unclassified record.
    pub fn new(
        id: PhotoId,
        locator: impl Into<String>,
        filename: impl Into<String>,
        captured_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            locator: locator.into(),
            filename: filename.into(),
            captured_date,
            tags: TagSet::new(),
            album: Album::unclassified(),
            size_bytes: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_album(mut self, album: Album) -> Self {
        self.album = album;
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn year(&self) -> i32 {
        self.captured_date.year()
    }

    pub fn month(&self) -> u32 {
        self.captured_date.month()
    }

    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PhotoRecord {
        PhotoRecord::new(
            PhotoId::new("p1").unwrap(),
            "https://cdn.example/p1.jpg",
            "20240115_beach.jpg",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    #[test]
    fn new_record_defaults() {
        let r = record();
        assert!(r.is_untagged());
        assert!(r.album.is_unclassified());
        assert_eq!(r.size_bytes, None);
        assert!(r.extra.is_empty());
    }

    #[test]
    fn year_and_month_come_from_capture_date() {
        let r = record();
        assert_eq!(r.year(), 2024);
        assert_eq!(r.month(), 1);
    }

    #[test]
    fn builders_set_metadata() {
        let r = record()
            .with_tags(["a", "b"].into_iter().collect())
            .with_album(Album::new("trips"))
            .with_size(2048);
        assert_eq!(r.tags.len(), 2);
        assert_eq!(r.album.as_str(), "trips");
        assert_eq!(r.size_bytes, Some(2048));
    }

    #[test]
    fn deserialize_fills_defaults() {
        let json = r#"{
            "id": "p9",
            "locator": "mem://p9",
            "filename": "x.jpg",
            "captured_date": "2023-05-06"
        }"#;
        let r: PhotoRecord = serde_json::from_str(json).unwrap();
        assert!(r.album.is_unclassified());
        assert!(r.tags.is_empty());
    }
}
