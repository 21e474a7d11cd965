//! Events describing committed changes.
//!
//! Operations return their events instead of broadcasting them; forwarding
//! them to an indexer or UI is up to the caller.

use serde::{Deserialize, Serialize};

use cipher_vault_core::{DataType, EntryId, Identity, LogId};
use cipher_vault_perms::PermissionLevel;

/// Something that happened as part of a committed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum VaultEvent {
    VaultEntryCreated {
        entry_id: EntryId,
        owner: Identity,
        data_type: DataType,
    },
    VaultEntryUpdated {
        entry_id: EntryId,
        updater: Identity,
    },
    AccessGranted {
        grantee: Identity,
        entry_id: EntryId,
        level: PermissionLevel,
    },
    AccessRevoked {
        grantee: Identity,
        entry_id: EntryId,
    },
    AuditLogCreated {
        log_id: LogId,
        entry_id: EntryId,
        actor: Identity,
    },
    ReputationUpdated {
        actor: Identity,
        new_score: u32,
    },
}

/// The result of a successful mutating request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committed<T> {
    pub value: T,
    /// Audit record written for the request.
    pub log_id: LogId,
    /// Events in the order they happened.
    pub events: Vec<VaultEvent>,
}

impl<T> Committed<T> {
    /// Swap the value, keeping the log id and events.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            value: f(self.value),
            log_id: self.log_id,
            events: self.events,
        }
    }

    /// Events of one kind, by predicate.
    pub fn events_matching<'a>(
        &'a self,
        pred: impl Fn(&VaultEvent) -> bool + 'a,
    ) -> impl Iterator<Item = &'a VaultEvent> + 'a {
        self.events.iter().filter(move |e| pred(*e))
    }
}

/// The result of a read, which is only recorded when the vault audits reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observed<T> {
    pub value: T,
    /// Audit record written for the read, if one was.
    pub log_id: Option<LogId>,
    pub events: Vec<VaultEvent>,
}

impl<T> Observed<T> {
    /// A read that left no record.
    pub fn unrecorded(value: T) -> Self {
        Self {
            value,
            log_id: None,
            events: Vec::new(),
        }
    }
}

impl<T> From<Committed<T>> for Observed<T> {
    fn from(committed: Committed<T>) -> Self {
        Self {
            value: committed.value,
            log_id: Some(committed.log_id),
            events: committed.events,
        }
    }
}
