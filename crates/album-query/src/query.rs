use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use album_types::{Album, NaiveDate, PhotoRecord, TagSet};
use serde::{Deserialize, Serialize};

/// Ordering applied to a query result. Every key sorts stably, so records
/// that compare equal keep their snapshot order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Oldest capture date first.
    DateAsc,
    /// Newest capture date first.
    #[default]
    DateDesc,
    /// Filename, lexicographic.
    NameAsc,
    /// Filename, reverse lexicographic.
    NameDesc,
    /// Smallest tag of each record; untagged records last.
    FirstTagAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::DateAsc,
        SortKey::DateDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::FirstTagAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DateAsc => "date-asc",
            SortKey::DateDesc => "date-desc",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::FirstTagAsc => "first-tag-asc",
        }
    }

    fn compare(&self, a: &PhotoRecord, b: &PhotoRecord) -> Ordering {
        match self {
            SortKey::DateAsc => a.captured_date.cmp(&b.captured_date),
            SortKey::DateDesc => b.captured_date.cmp(&a.captured_date),
            SortKey::NameAsc => a.filename.cmp(&b.filename),
            SortKey::NameDesc => b.filename.cmp(&a.filename),
            SortKey::FirstTagAsc => match (a.tags.first(), b.tags.first()) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unrecognised sort key name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key {0:?}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" | "date-asc" => Ok(SortKey::DateAsc),
            "date-desc" | "newest" => Ok(SortKey::DateDesc),
            "name" | "name-asc" => Ok(SortKey::NameAsc),
            "name-desc" => Ok(SortKey::NameDesc),
            "tag" | "first-tag" | "first-tag-asc" => Ok(SortKey::FirstTagAsc),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Filter predicates plus one sort key.
///
/// A record passes when it satisfies every predicate that is set. `tags` is
/// conjunctive (the record must carry all of them). `untagged_only`
/// replaces the tag predicate instead of combining with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub album: Option<Album>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub on_date: Option<NaiveDate>,
    pub tags: TagSet,
    pub untagged_only: bool,
    pub sort: SortKey,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn album(mut self, album: Album) -> Self {
        self.album = Some(album);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.on_date = Some(date);
        self
    }

    pub fn tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn untagged_only(mut self, untagged_only: bool) -> Self {
        self.untagged_only = untagged_only;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Returns `true` if no predicate is set.
    pub fn is_unfiltered(&self) -> bool {
        self.album.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.on_date.is_none()
            && self.tags.is_empty()
            && !self.untagged_only
    }
}

/// Check a single record against the query's predicates.
pub fn matches(record: &PhotoRecord, query: &Query) -> bool {
    if let Some(album) = &query.album {
        if &record.album != album {
            return false;
        }
    }
    if let Some(year) = query.year {
        if record.year() != year {
            return false;
        }
    }
    if let Some(month) = query.month {
        if record.month() != month {
            return false;
        }
    }
    if let Some(date) = query.on_date {
        if record.captured_date != date {
            return false;
        }
    }
    if query.untagged_only {
        record.is_untagged()
    } else {
        record.tags.is_superset(&query.tags)
    }
}

/// Filter and order a snapshot.
pub fn run<'a>(snapshot: &'a [PhotoRecord], query: &Query) -> Vec<&'a PhotoRecord> {
    let mut result: Vec<&PhotoRecord> = snapshot.iter().filter(|r| matches(r, query)).collect();
    // `sort_by` is stable.
    result.sort_by(|a, b| query.sort.compare(a, b));
    result
}
