//! Error types for the Cipher Vault Core.

use thiserror::Error;

/// Errors from parsing and converting core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid {what} length: expected {expected} bytes")]
    InvalidLength { expected: usize, what: &'static str },

    #[error("unknown action code: {0}")]
    UnknownAction(u8),

    #[error("unknown audit outcome code: {0}")]
    UnknownOutcome(u8),
}

/// Validation errors for caller-supplied request fields.
///
/// These are raised before anything is mutated or audited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid data type: {0} (expected 1..=4)")]
    InvalidDataType(u8),

    #[error("invalid permission level: {0} (expected 1..=3)")]
    InvalidPermissionLevel(u8),

    #[error("invalid metadata hash: {0}")]
    InvalidHash(String),
}
