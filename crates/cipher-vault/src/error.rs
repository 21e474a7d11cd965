//! Error types for the vault.

use cipher_vault_core::{Action, EntryId, Identity, LogId, ValidationError};
use cipher_vault_perms::{PermissionLevel, PermsError};
use cipher_vault_store::StoreError;
use thiserror::Error;

use crate::events::VaultEvent;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The entry does not exist, or is inactive for an operation that needs it live.
    #[error("entry not found: {entry_id}")]
    EntryNotFound { entry_id: EntryId },

    /// The actor lacks the required level.
    ///
    /// Denials raised by the controller carry the audit record written for
    /// them, the actor's score after the penalty and the events recording
    /// both.
    #[error("{actor} is not authorized for {required:?} on entry {entry_id}")]
    Unauthorized {
        actor: Identity,
        entry_id: EntryId,
        required: PermissionLevel,
        log_id: Option<LogId>,
        reputation: Option<u32>,
        events: Vec<VaultEvent>,
    },

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The audit append failed, so nothing was applied.
    #[error("storage fault recording {action:?} on entry {entry_id} by {actor}: {source}")]
    StorageFault {
        entry_id: EntryId,
        actor: Identity,
        action: Action,
        #[source]
        source: StoreError,
    },

    /// Storage error outside a mutating request (audit queries, stats).
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The commit task did not run to completion.
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl From<PermsError> for VaultError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::Unauthorized {
                actor,
                entry_id,
                required,
            } => VaultError::Unauthorized {
                actor,
                entry_id,
                required,
                log_id: None,
                reputation: None,
                events: Vec::new(),
            },
            PermsError::Validation(e) => VaultError::Validation(e),
        }
    }
}

/// What a caller should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient; the same request may be sent again as is.
    Retry,
    /// Obtain the missing permission first.
    Reauthorize,
    /// The request itself is wrong and will never succeed.
    Reject,
    /// Outcome unknown to the caller; read state back before retrying.
    RecheckState,
}

impl VaultError {
    /// Classify this error for the caller.
    pub fn disposition(&self) -> Disposition {
        match self {
            VaultError::Unauthorized { .. } => Disposition::Reauthorize,
            VaultError::Validation(_) | VaultError::EntryNotFound { .. } => Disposition::Reject,
            VaultError::StorageFault { .. } | VaultError::Aborted(_) => Disposition::RecheckState,
            VaultError::Store(_) => Disposition::Retry,
        }
    }

    /// True for denials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, VaultError::Unauthorized { .. })
    }

    /// Events emitted by the failed request. Only recorded denials have any.
    pub fn events(&self) -> &[VaultEvent] {
        match self {
            VaultError::Unauthorized { events, .. } => events,
            _ => &[],
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispositions() {
        let actor = Identity::derive("mallory");
        let denied = VaultError::Unauthorized {
            actor,
            entry_id: EntryId(1),
            required: PermissionLevel::Write,
            log_id: Some(LogId(3)),
            reputation: Some(0),
            events: vec![VaultEvent::AuditLogCreated {
                log_id: LogId(3),
                entry_id: EntryId(1),
                actor,
            }],
        };
        assert_eq!(denied.disposition(), Disposition::Reauthorize);
        assert!(denied.is_unauthorized());
        assert_eq!(denied.events().len(), 1);

        let invalid = VaultError::from(ValidationError::InvalidDataType(9));
        assert_eq!(invalid.disposition(), Disposition::Reject);

        let missing = VaultError::EntryNotFound { entry_id: EntryId(4) };
        assert_eq!(missing.disposition(), Disposition::Reject);

        let fault = VaultError::StorageFault {
            entry_id: EntryId(1),
            actor,
            action: Action::Update,
            source: StoreError::Unavailable("disk full".into()),
        };
        assert_eq!(fault.disposition(), Disposition::RecheckState);
        assert!(fault.events().is_empty());
        assert!(fault.to_string().contains("disk full"));

        assert_eq!(
            VaultError::Store(StoreError::Unavailable("busy".into())).disposition(),
            Disposition::Retry
        );
    }

    #[test]
    fn test_from_perms_error() {
        let err = VaultError::from(PermsError::Unauthorized {
            actor: Identity::derive("bob"),
            entry_id: EntryId(2),
            required: PermissionLevel::Admin,
        });
        match err {
            VaultError::Unauthorized { log_id, reputation, required, events, .. } => {
                assert!(events.is_empty());
                assert_eq!(log_id, None);
                assert_eq!(reputation, None);
                assert_eq!(required, PermissionLevel::Admin);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
