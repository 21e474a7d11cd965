//! Request field validation.
//!
//! Validation runs before authorization, mutation and audit. A request that
//! fails here leaves no trace.

use crate::entry::DataType;
use crate::error::ValidationError;

/// Maximum accepted metadata hash length in bytes.
pub const MAX_METADATA_HASH_LEN: usize = 512;

/// Validate a data type wire code.
pub fn validate_data_type(code: u8) -> Result<DataType, ValidationError> {
    DataType::try_from(code)
}

/// Validate a metadata hash.
///
/// The hash is opaque to the vault; it only has to be non-empty, free of
/// surrounding whitespace and control characters, and of bounded length.
pub fn validate_metadata_hash(hash: &str) -> Result<(), ValidationError> {
    if hash.trim().is_empty() {
        return Err(ValidationError::InvalidHash("empty".into()));
    }
    if hash.len() > MAX_METADATA_HASH_LEN {
        return Err(ValidationError::InvalidHash(format!(
            "length {} exceeds {}",
            hash.len(),
            MAX_METADATA_HASH_LEN
        )));
    }
    if hash.trim() != hash || hash.chars().any(char::is_control) {
        return Err(ValidationError::InvalidHash(
            "contains whitespace padding or control characters".into(),
        ));
    }
    Ok(())
}
