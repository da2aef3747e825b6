use std::fmt;

use serde::{Deserialize, Serialize};

/// Version token of a stored value, comparable to an HTTP ETag.
///
/// Derived from the BLAKE3 hash of the stored bytes, so two stores holding
/// the same bytes under a key report the same revision.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Revision of the given bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(blake3::hash(data).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 8 characters) for logs and display.
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.short())
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Condition a write must satisfy against the current value of its key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional write (last writer wins).
    #[default]
    Any,
    /// The key must not exist yet.
    Absent,
    /// The key must currently hold exactly this revision.
    Matches(Revision),
}

impl Precondition {
    /// Precondition for "the value I last read", where `None` means the key
    /// did not exist when it was read.
    pub fn from_observed(observed: Option<&Revision>) -> Self {
        match observed {
            Some(rev) => Self::Matches(rev.clone()),
            None => Self::Absent,
        }
    }

    /// Returns `true` if a key currently at `current` satisfies this
    /// precondition.
    pub fn is_satisfied_by(&self, current: Option<&Revision>) -> bool {
        match self {
            Self::Any => true,
            Self::Absent => current.is_none(),
            Self::Matches(expected) => current == Some(expected),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any revision"),
            Self::Absent => f.write_str("no blob"),
            Self::Matches(rev) => write!(f, "revision {}", rev.short()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_is_deterministic() {
        assert_eq!(Revision::of(b"abc"), Revision::of(b"abc"));
        assert_ne!(Revision::of(b"abc"), Revision::of(b"abd"));
    }

    #[test]
    fn short_is_8_chars() {
        assert_eq!(Revision::of(b"x").short().len(), 8);
        assert_eq!(Revision::of(b"x").as_str().len(), 64);
    }

    #[test]
    fn preconditions() {
        let rev = Revision::of(b"v1");
        let other = Revision::of(b"v2");

        assert!(Precondition::Any.is_satisfied_by(None));
        assert!(Precondition::Any.is_satisfied_by(Some(&rev)));

        assert!(Precondition::Absent.is_satisfied_by(None));
        assert!(!Precondition::Absent.is_satisfied_by(Some(&rev)));

        let m = Precondition::Matches(rev.clone());
        assert!(m.is_satisfied_by(Some(&rev)));
        assert!(!m.is_satisfied_by(Some(&other)));
        assert!(!m.is_satisfied_by(None));
    }

    #[test]
    fn from_observed() {
        let rev = Revision::of(b"v1");
        assert_eq!(Precondition::from_observed(None), Precondition::Absent);
        assert_eq!(
            Precondition::from_observed(Some(&rev)),
            Precondition::Matches(rev)
        );
    }
}
