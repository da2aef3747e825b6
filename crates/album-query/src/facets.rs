//! Scans over a collection that feed filter pickers.
//!
//! The tag vocabulary is open, so the list of tags to suggest is derived
//! from the records themselves rather than from a fixed enumeration.

use std::collections::{BTreeMap, BTreeSet};

use album_types::{Album, PhotoRecord};

/// Every tag in use, sorted and de-duplicated.
pub fn known_tags<'a>(records: impl IntoIterator<Item = &'a PhotoRecord>) -> Vec<String> {
    let mut tags = BTreeSet::new();
    for record in records {
        tags.extend(record.tags.iter().map(str::to_string));
    }
    tags.into_iter().collect()
}

/// Number of records carrying each tag.
pub fn tag_counts<'a>(
    records: impl IntoIterator<Item = &'a PhotoRecord>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        for tag in record.tags.iter() {
            *counts.entry(tag.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Number of records in each album.
pub fn albums<'a>(records: impl IntoIterator<Item = &'a PhotoRecord>) -> BTreeMap<Album, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.album.clone()).or_insert(0) += 1;
    }
    counts
}

/// Capture years present, newest first.
pub fn years<'a>(records: impl IntoIterator<Item = &'a PhotoRecord>) -> Vec<i32> {
    let set: BTreeSet<i32> = records.into_iter().map(PhotoRecord::year).collect();
    set.into_iter().rev().collect()
}

/// Capture months present within `year`, ascending.
pub fn months<'a>(records: impl IntoIterator<Item = &'a PhotoRecord>, year: i32) -> Vec<u32> {
    let set: BTreeSet<u32> = records
        .into_iter()
        .filter(|r| r.year() == year)
        .map(PhotoRecord::month)
        .collect();
    set.into_iter().collect()
}
