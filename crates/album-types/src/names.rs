//! Tag and album name validation.
//!
//! Valid names:
//! - Must be non-empty after trimming
//! - Must not contain control characters (tabs, newlines, ...)
//! - Must not be longer than [`MAX_NAME_LEN`] characters
//!
//! The vocabulary is open: any name passing these checks is accepted, new
//! tags included.

use crate::error::TypeError;

/// Longest accepted tag or album name, in characters.
pub const MAX_NAME_LEN: usize = 64;

/// Validate a tag name supplied at an edit boundary.
///
/// ```
/// use album_types::validate_tag_name;
///
/// assert!(validate_tag_name("beach").is_ok());
/// assert!(validate_tag_name("上色").is_ok());
/// assert!(validate_tag_name("").is_err());
/// assert!(validate_tag_name("two\nlines").is_err());
/// ```
pub fn validate_tag_name(name: &str) -> Result<(), TypeError> {
    check(name).map_err(|reason| TypeError::InvalidTag {
        name: name.to_string(),
        reason,
    })
}

/// Validate an album name supplied at an edit boundary.
pub fn validate_album_name(name: &str) -> Result<(), TypeError> {
    check(name).map_err(|reason| TypeError::InvalidAlbum {
        name: name.to_string(),
        reason,
    })
}

fn check(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("name must not be empty".into());
    }
    if let Some(ch) = trimmed.chars().find(|c| c.is_control()) {
        return Err(format!("contains control character: {ch:?}"));
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(format!("{len} characters exceeds the limit of {MAX_NAME_LEN}"));
    }
    Ok(())
}
