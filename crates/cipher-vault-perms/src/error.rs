//! Error types for the permissions module.

use cipher_vault_core::{EntryId, Identity, ValidationError};
use thiserror::Error;

use crate::grant::PermissionLevel;

/// Errors that can occur during permission operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The actor lacks the level the operation needs.
    #[error("{actor} lacks {required:?} on entry {entry_id}")]
    Unauthorized {
        actor: Identity,
        entry_id: EntryId,
        required: PermissionLevel,
    },

    /// Invalid request field.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
