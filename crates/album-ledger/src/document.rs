//! Wire format of the ledger document.
//!
//! The document is a JSON array with one object per photo:
//!
//! ```json
//! [
//!   {
//!     "public_id": "photos/9f2c...",
//!     "url": "https://cdn.example/photos/9f2c....jpg",
//!     "name": "20240115_beach.jpg",
//!     "date_str": "2024-01-15",
//!     "tags": ["beach", "family"],
//!     "album": "trips",
//!     "size": 183204
//!   }
//! ]
//! ```
//!
//! `album` and `size` are optional: a missing album reads as the sentinel and
//! is written out explicitly on the next save. Every other key is kept in
//! [`PhotoRecord::extra`] and written back, including keys that look like
//! older names of the fields above. A bare `date` is only read when
//! `date_str` is absent.

use std::collections::{BTreeMap, HashSet};

use album_types::{Album, PhotoId, PhotoRecord, TagSet};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys owned by [`LedgerEntry`]; never written from `extra`.
const RESERVED_KEYS: &[&str] = &[
    "public_id", "url", "name", "date_str", "tags", "album", "size",
];

/// Fallback for `date_str` in entries written before it existed.
const LEGACY_DATE_KEY: &str = "date";

/// One element of the ledger array, as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "public_id")]
    pub id: String,
    #[serde(rename = "url", default)]
    pub locator: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date_str: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl LedgerEntry {
    pub fn from_record(record: &PhotoRecord) -> Self {
        let extra = record
            .extra
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            id: record.id.to_string(),
            locator: record.locator.clone(),
            name: record.filename.clone(),
            date_str: Some(record.captured_date.format(DATE_FORMAT).to_string()),
            tags: record.tags.to_vec(),
            album: Some(record.album.to_string()),
            size: record.size_bytes,
            extra,
        }
    }

    /// Convert to a typed record, applying defaults for missing fields.
    pub fn into_record(self) -> Result<PhotoRecord, String> {
        let id = PhotoId::new(self.id).map_err(|e| e.to_string())?;
        let raw_date = match &self.date_str {
            Some(date) => date.as_str(),
            None => self
                .extra
                .get(LEGACY_DATE_KEY)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| format!("photo {id}: missing date_str"))?,
        };
        let captured_date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT)
            .map_err(|e| format!("photo {id}: invalid date_str {raw_date:?}: {e}"))?;
        Ok(PhotoRecord {
            id,
            locator: self.locator,
            filename: self.name,
            captured_date,
            tags: self.tags.into_iter().collect::<TagSet>(),
            album: self.album.map(Album::new).unwrap_or_default(),
            size_bytes: self.size,
            extra: self.extra,
        })
    }
}

/// Serialize a collection to the ledger document.
pub fn encode(records: &[PhotoRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let entries: Vec<LedgerEntry> = records.iter().map(LedgerEntry::from_record).collect();
    serde_json::to_vec_pretty(&entries)
}

/// Parse a ledger document. Errors are human-readable reasons.
///
/// Rejects documents with duplicate ids: the collection invariant would not
/// hold and there is no safe way to pick a winner.
pub fn decode(data: &[u8]) -> Result<Vec<PhotoRecord>, String> {
    let entries: Vec<LedgerEntry> = serde_json::from_slice(data).map_err(|e| e.to_string())?;
    let mut seen = HashSet::with_capacity(entries.len());
    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let record = entry
            .into_record()
            .map_err(|reason| format!("entry {index}: {reason}"))?;
        if !seen.insert(record.id.clone()) {
            return Err(format!("entry {index}: duplicate photo id {}", record.id));
        }
        records.push(record);
    }
    Ok(records)
}
