//! Blob key validation and upload key assignment.
//!
//! Valid keys:
//! - Must be non-empty
//! - Must not start or end with `/`
//! - Must not contain `\`, control characters, or empty components (`//`)
//! - Components must not be `.` or `..`

use crate::error::{StoreError, StoreResult};

/// Number of hex characters of the content hash used in upload keys.
const CONTENT_KEY_HEX_LEN: usize = 20;

/// Validate a blob key, returning `Ok(())` if it is usable by every backend.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let fail = |reason: &str| {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        })
    };

    if key.is_empty() {
        return fail("key must not be empty");
    }
    if key.starts_with('/') || key.ends_with('/') {
        return fail("must not start or end with '/'");
    }
    if key.contains('\\') {
        return fail("must not contain '\\'");
    }
    if key.chars().any(char::is_control) {
        return fail("must not contain control characters");
    }
    for component in key.split('/') {
        match component {
            "" => return fail("must not contain empty components"),
            "." | ".." => return fail("must not contain '.' or '..' components"),
            _ => {}
        }
    }
    Ok(())
}

/// Content-derived key for `data`: `<prefix>/<hash>`.
///
/// Identical bytes always map to the same key. Used by
/// [`UploadMode::Deduplicate`](crate::UploadMode::Deduplicate).
pub fn content_key(prefix: &str, data: &[u8]) -> StoreResult<String> {
    let hash = blake3::hash(data);
    let hex = hex::encode(hash.as_bytes());
    under_prefix(prefix, &hex[..CONTENT_KEY_HEX_LEN])
}

/// Fresh key below `prefix`, distinct on every call.
///
/// The name is a time-ordered UUIDv7, so keys uploaded later sort later.
pub fn unique_key(prefix: &str) -> StoreResult<String> {
    let id = uuid::Uuid::now_v7();
    under_prefix(prefix, &id.simple().to_string())
}

fn under_prefix(prefix: &str, name: &str) -> StoreResult<String> {
    let prefix = prefix.trim_matches('/');
    let key = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    };
    validate_key(&key)?;
    Ok(key)
}
