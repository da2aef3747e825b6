use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::names::validate_album_name;

/// Album assigned to records that were never classified.
pub const UNCLASSIFIED: &str = "unclassified";

/// Sentinel written by older ledger revisions; read as [`UNCLASSIFIED`].
pub const LEGACY_UNCLASSIFIED: &str = "未分類";

/// The album a record belongs to. Never empty.
///
/// Every record has exactly one album. Blank input and the legacy sentinel
/// both normalise to [`Album::unclassified`], so "no album" has a single
/// representation in memory.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Album(String);

impl Album {
    /// Normalising constructor used when reading stored data.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed == LEGACY_UNCLASSIFIED {
            return Self::unclassified();
        }
        Self(trimmed.to_string())
    }

    /// Validating constructor used at edit boundaries.
    pub fn parse(name: &str) -> Result<Self, TypeError> {
        validate_album_name(name)?;
        Ok(Self::new(name))
    }

    pub fn unclassified() -> Self {
        Self(UNCLASSIFIED.to_string())
    }

    pub fn is_unclassified(&self) -> bool {
        self.0 == UNCLASSIFIED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Album {
    fn default() -> Self {
        Self::unclassified()
    }
}

impl From<String> for Album {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Album {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Album> for String {
    fn from(album: Album) -> Self {
        album.0
    }
}

impl fmt::Debug for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Album({})", self.0)
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
