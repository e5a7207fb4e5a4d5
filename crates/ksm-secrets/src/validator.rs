//! Structural validation of secret records.
//!
//! Runs before any store call so that malformed input never costs a
//! round-trip. Every check here is pure and deterministic.

use crate::error::ValidationError;
use crate::types::SecretRecord;

/// Maximum length of an entry key (DNS subdomain limit).
pub const MAX_KEY_LEN: usize = 253;

/// Validate a record submitted for create or update.
///
/// Checks, in order: `name`, `namespace`, then `entries` (non-empty, every
/// key well-formed). Values are not inspected; an empty value is valid.
pub fn validate_record(record: &SecretRecord) -> Result<(), ValidationError> {
    validate_identity(&record.namespace, &record.name)?;

    if record.entries.is_empty() {
        return Err(ValidationError::new(
            "data",
            "at least one data entry is required",
        ));
    }

    for key in record.entries.keys() {
        if key.is_empty() {
            return Err(ValidationError::new("data", "empty key is not allowed"));
        }
        if !is_valid_key(key) {
            return Err(ValidationError::new(
                "data",
                format!("invalid key format: {}", key),
            ));
        }
    }

    Ok(())
}

/// Validate the `(namespace, name)` pair that addresses a record.
pub fn validate_identity(namespace: &str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("name", "name is required"));
    }
    validate_namespace(namespace)
}

/// Validate a namespace on its own, as used by list.
pub fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    if namespace.is_empty() {
        return Err(ValidationError::new("namespace", "namespace is required"));
    }
    Ok(())
}

/// Whether `key` is a DNS-subdomain-style entry key.
///
/// At most [`MAX_KEY_LEN`] bytes of `a-z`, `0-9`, `-` and `.`, starting and
/// ending with a letter or digit.
pub fn is_valid_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    if bytes.len() > MAX_KEY_LEN {
        return false;
    }

    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    alnum(first) && alnum(last) && bytes.iter().all(|b| alnum(b) || *b == b'-' || *b == b'.')
}
