use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::names::validate_tag_name;

/// An open, de-duplicated set of tags.
///
/// Tags are matched case-sensitively and iterated in lexicographic order, so
/// insertion order never leaks into comparisons or sort keys. Values are
/// trimmed on the way in and blank values are dropped.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Build a tag set from user-supplied names, validating each one.
    ///
    /// Use this at edit boundaries; `FromIterator` is the lenient path used
    /// when reading stored data.
    pub fn parse<I, S>(names: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.as_ref();
            validate_tag_name(name)?;
            set.insert(name);
        }
        Ok(set)
    }

    /// Insert a tag. Returns `true` if it was not already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.0.insert(tag.to_string())
    }

    /// Remove a tag. Returns `true` if it was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        self.0.remove(tag.trim())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The lexicographically smallest tag, if any.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Returns `true` if every tag in `other` is also in `self`.
    pub fn is_superset(&self, other: &TagSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Add every tag of `other` to this set.
    pub fn extend_from(&mut self, other: &TagSet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Remove every tag of `other` from this set.
    pub fn remove_all(&mut self, other: &TagSet) {
        self.0.retain(|t| !other.0.contains(t));
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Self {
        tags.0.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let tags: TagSet = ["b", "a", "b", " a "].into_iter().collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.to_vec(), vec!["a", "b"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let tags: TagSet = ["Beach", "beach"].into_iter().collect();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("Beach"));
        assert!(!tags.contains("BEACH"));
    }

    #[test]
    fn blank_values_are_dropped() {
        let tags: TagSet = ["", "  ", "x"].into_iter().collect();
        assert_eq!(tags.to_vec(), vec!["x"]);
    }

    #[test]
    fn first_is_lexicographic_minimum() {
        let tags: TagSet = ["zebra", "apple", "mango"].into_iter().collect();
        assert_eq!(tags.first(), Some("apple"));
        assert_eq!(TagSet::new().first(), None);
    }

    #[test]
    fn superset_is_conjunctive() {
        let record: TagSet = ["a", "b"].into_iter().collect();
        let wanted_ab: TagSet = ["a", "b"].into_iter().collect();
        let wanted_ac: TagSet = ["a", "c"].into_iter().collect();
        assert!(record.is_superset(&wanted_ab));
        assert!(!record.is_superset(&wanted_ac));
        assert!(record.is_superset(&TagSet::new()));
    }

    #[test]
    fn parse_validates_names() {
        assert!(TagSet::parse(["ok", "fine"]).is_ok());
        assert!(TagSet::parse(["ok", ""]).is_err());
    }

    #[test]
    fn extend_and_remove_all() {
        let mut tags: TagSet = ["a"].into_iter().collect();
        tags.extend_from(&["b", "c"].into_iter().collect());
        tags.remove_all(&["a", "c"].into_iter().collect());
        assert_eq!(tags.to_vec(), vec!["b"]);
    }

    #[test]
    fn serde_uses_sorted_array() {
        let tags: TagSet = ["b", "a"].into_iter().collect();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
        let parsed: TagSet = serde_json::from_str(r#"["x","x","y"]"#).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}
