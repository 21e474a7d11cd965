//! Audit records.
//!
//! Every state-changing request, and every denied attempt, leaves exactly one
//! record. Records are never edited or removed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::Identity;
use crate::types::{EntryId, LogId, Timestamp};

/// The action an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Create = 1,
    Read = 2,
    Update = 3,
    Delete = 4,
    GrantAccess = 5,
    RevokeAccess = 6,
}

impl Action {
    /// Convert from the storage code.
    pub fn from_u8(code: u8) -> Result<Self, CoreError> {
        match code {
            1 => Ok(Action::Create),
            2 => Ok(Action::Read),
            3 => Ok(Action::Update),
            4 => Ok(Action::Delete),
            5 => Ok(Action::GrantAccess),
            6 => Ok(Action::RevokeAccess),
            other => Err(CoreError::UnknownAction(other)),
        }
    }

    /// The storage code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Whether the audited attempt went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuditOutcome {
    Success = 0,
    Denied = 1,
}

impl AuditOutcome {
    pub fn from_u8(code: u8) -> Result<Self, CoreError> {
        match code {
            0 => Ok(AuditOutcome::Success),
            1 => Ok(AuditOutcome::Denied),
            other => Err(CoreError::UnknownOutcome(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A record about to be appended. The store assigns its [`LogId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub entry_id: EntryId,
    pub actor: Identity,
    pub action: Action,
    pub outcome: AuditOutcome,
    pub timestamp: Timestamp,
}

impl NewAuditRecord {
    /// Attach the id the store assigned.
    pub fn with_id(self, log_id: LogId) -> AuditRecord {
        AuditRecord {
            log_id,
            entry_id: self.entry_id,
            actor: self.actor,
            action: self.action,
            outcome: self.outcome,
            timestamp: self.timestamp,
        }
    }
}

/// One committed line of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub log_id: LogId,
    pub entry_id: EntryId,
    pub actor: Identity,
    pub action: Action,
    pub outcome: AuditOutcome,
    pub timestamp: Timestamp,
}

/// Selection criteria for audit queries. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub entry_id: Option<EntryId>,
    pub actor: Option<Identity>,
}

impl AuditFilter {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records about one entry.
    pub fn for_entry(entry_id: EntryId) -> Self {
        Self {
            entry_id: Some(entry_id),
            actor: None,
        }
    }

    /// Match records by one actor.
    pub fn for_actor(actor: Identity) -> Self {
        Self {
            entry_id: None,
            actor: Some(actor),
        }
    }

    /// Narrow to an actor as well.
    pub fn and_actor(mut self, actor: Identity) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Check whether a record matches.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.entry_id.map_or(true, |id| record.entry_id == id)
            && self.actor.map_or(true, |actor| record.actor == actor)
    }
}
