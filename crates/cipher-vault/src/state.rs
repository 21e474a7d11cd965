//! In-memory vault state and the staged mutations applied to it.
//!
//! Requests are split in two halves. Staging (`stage_*`) validates input
//! and authorizes the actor against a shared borrow of the state, producing
//! a [`Mutation`] that has not touched anything yet. Once the audit record is
//! written, [`VaultState::apply`] commits the mutation through `&mut`.
//! Nothing in `apply` can be refused.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::error;

use cipher_vault_core::{
    validate_metadata_hash, Action, CiphertextHandle, DataType, EntryId, EntryView, Identity,
    Timestamp, VaultEntry,
};
use cipher_vault_perms::{PermissionGrant, PermissionLevel, PermissionRegistry};

use crate::config::ReputationConfig;
use crate::entries::EntryStore;
use crate::error::{Result, VaultError};
use crate::events::VaultEvent;
use crate::reputation::{ActionOutcome, ReputationEngine};

/// An authorized change that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(VaultEntry),
    Update {
        entry_id: EntryId,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
    },
    Deactivate {
        entry_id: EntryId,
    },
    Grant(PermissionGrant),
    Revoke {
        entry_id: EntryId,
        grantee: Identity,
    },
    /// An audited read. Changes nothing.
    Read {
        entry_id: EntryId,
    },
}

impl Mutation {
    /// The audit action this mutation is recorded as.
    pub fn action(&self) -> Action {
        match self {
            Mutation::Create(_) => Action::Create,
            Mutation::Update { .. } => Action::Update,
            Mutation::Deactivate { .. } => Action::Delete,
            Mutation::Grant(_) => Action::GrantAccess,
            Mutation::Revoke { .. } => Action::RevokeAccess,
            Mutation::Read { .. } => Action::Read,
        }
    }

    pub fn entry_id(&self) -> EntryId {
        match self {
            Mutation::Create(entry) => entry.id,
            Mutation::Grant(grant) => grant.entry_id,
            Mutation::Update { entry_id, .. }
            | Mutation::Deactivate { entry_id }
            | Mutation::Revoke { entry_id, .. }
            | Mutation::Read { entry_id } => *entry_id,
        }
    }
}

/// Aggregate counters for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStats {
    pub total_entries: usize,
    pub active_entries: usize,
    /// Live entries per data type.
    pub entries_by_type: BTreeMap<DataType, usize>,
    /// Stored grants, lapsed ones included.
    pub stored_grants: usize,
    /// Identities that have a reputation score.
    pub known_identities: usize,
    pub audit_records: u64,
}

/// Entries, grants and scores.
#[derive(Debug)]
pub struct VaultState {
    entries: EntryStore,
    permissions: PermissionRegistry,
    reputation: ReputationEngine,
}

impl VaultState {
    pub fn new(config: &ReputationConfig) -> Self {
        Self::with_reputation(ReputationEngine::new(config))
    }

    pub fn with_reputation(reputation: ReputationEngine) -> Self {
        Self {
            entries: EntryStore::new(),
            permissions: PermissionRegistry::new(),
            reputation,
        }
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub fn permissions(&self) -> &PermissionRegistry {
        &self.permissions
    }

    pub fn reputation(&self) -> &ReputationEngine {
        &self.reputation
    }

    fn live_entry(&self, entry_id: EntryId) -> Result<&VaultEntry> {
        self.entries
            .get_active(entry_id)
            .ok_or(VaultError::EntryNotFound { entry_id })
    }

    fn any_entry(&self, entry_id: EntryId) -> Result<&VaultEntry> {
        self.entries
            .get(entry_id)
            .ok_or(VaultError::EntryNotFound { entry_id })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Staging
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate a new entry and reserve its id.
    ///
    /// Takes `&mut` only for the id counter; the entry itself is not stored
    /// until [`apply`](Self::apply).
    pub fn stage_create(
        &mut self,
        owner: Identity,
        data_type: u8,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<Mutation> {
        let entry = self.entries.prepare(
            owner,
            data_type,
            ciphertext_handle,
            is_public,
            metadata_hash,
            now,
        )?;
        Ok(Mutation::Create(entry))
    }

    /// Owner or Write.
    pub fn stage_update(
        &self,
        actor: &Identity,
        entry_id: EntryId,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<Mutation> {
        validate_metadata_hash(&metadata_hash)?;
        let entry = self.live_entry(entry_id)?;
        self.permissions
            .check(actor, entry, PermissionLevel::Write, now)?;
        Ok(Mutation::Update {
            entry_id,
            ciphertext_handle,
            is_public,
            metadata_hash,
        })
    }

    /// Owner or Admin. Inactive entries are accepted so repeats are no-ops.
    pub fn stage_deactivate(
        &self,
        actor: &Identity,
        entry_id: EntryId,
        now: Timestamp,
    ) -> Result<Mutation> {
        let entry = self.any_entry(entry_id)?;
        self.permissions.check_admin(actor, entry, now)?;
        Ok(Mutation::Deactivate { entry_id })
    }

    /// Owner or Admin, on a live entry.
    pub fn stage_grant(
        &self,
        actor: &Identity,
        grantee: Identity,
        entry_id: EntryId,
        level: u8,
        duration: u64,
        now: Timestamp,
    ) -> Result<Mutation> {
        let level = PermissionLevel::try_from(level)?;
        let entry = self.live_entry(entry_id)?;
        self.permissions.check_admin(actor, entry, now)?;
        Ok(Mutation::Grant(PermissionGrant::issue(
            entry_id, grantee, level, *actor, now, duration,
        )))
    }

    /// Owner or Admin. Allowed on inactive entries so stale grants can be cleaned up.
    pub fn stage_revoke(
        &self,
        actor: &Identity,
        grantee: Identity,
        entry_id: EntryId,
        now: Timestamp,
    ) -> Result<Mutation> {
        let entry = self.any_entry(entry_id)?;
        self.permissions.check_admin(actor, entry, now)?;
        Ok(Mutation::Revoke { entry_id, grantee })
    }

    /// Resolve what `actor` may see of an entry.
    ///
    /// Inactive entries yield their tombstone to anyone. Live entries need
    /// ownership, public visibility, or an active Read grant.
    pub fn stage_read(&self, actor: &Identity, entry_id: EntryId, now: Timestamp) -> Result<EntryView> {
        let entry = self.any_entry(entry_id)?;
        if entry.active {
            self.permissions
                .check(actor, entry, PermissionLevel::Read, now)?;
        }
        Ok(entry.view())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commit
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit a staged mutation and return its domain event, if any.
    pub fn apply(&mut self, actor: Identity, mutation: &Mutation, now: Timestamp) -> Option<VaultEvent> {
        match mutation {
            Mutation::Create(entry) => {
                self.entries.insert(entry.clone());
                Some(VaultEvent::VaultEntryCreated {
                    entry_id: entry.id,
                    owner: entry.owner,
                    data_type: entry.data_type,
                })
            }
            Mutation::Update {
                entry_id,
                ciphertext_handle,
                is_public,
                metadata_hash,
            } => {
                let applied = self.entries.update(
                    *entry_id,
                    *ciphertext_handle,
                    *is_public,
                    metadata_hash.clone(),
                    now,
                );
                match applied {
                    Ok(()) => Some(VaultEvent::VaultEntryUpdated {
                        entry_id: *entry_id,
                        updater: actor,
                    }),
                    Err(e) => {
                        error!(entry = %entry_id, error = %e, "staged update no longer applies");
                        None
                    }
                }
            }
            Mutation::Deactivate { entry_id } => {
                if let Err(e) = self.entries.deactivate(*entry_id, now) {
                    error!(entry = %entry_id, error = %e, "staged deactivation no longer applies");
                }
                None
            }
            Mutation::Grant(grant) => {
                self.permissions.insert(grant.clone());
                Some(VaultEvent::AccessGranted {
                    grantee: grant.grantee,
                    entry_id: grant.entry_id,
                    level: grant.level,
                })
            }
            Mutation::Revoke { entry_id, grantee } => {
                self.permissions.remove(*entry_id, grantee);
                Some(VaultEvent::AccessRevoked {
                    grantee: *grantee,
                    entry_id: *entry_id,
                })
            }
            Mutation::Read { .. } => None,
        }
    }

    /// Score an outcome. Returns an event only when the score moved.
    pub fn record_outcome(
        &mut self,
        actor: Identity,
        action: Action,
        outcome: ActionOutcome,
    ) -> (u32, Option<VaultEvent>) {
        let before = self.reputation.get(&actor);
        let after = self.reputation.record(actor, action, outcome);
        let event = (after != before).then_some(VaultEvent::ReputationUpdated {
            actor,
            new_score: after,
        });
        (after, event)
    }

    /// Drop lapsed grants.
    pub fn purge_expired_grants(&mut self, now: Timestamp) -> usize {
        self.permissions.purge_expired(now)
    }

    /// Counters, with the audit length supplied by the caller.
    pub fn stats(&self, audit_records: u64) -> VaultStats {
        VaultStats {
            total_entries: self.entries.len(),
            active_entries: self.entries.active_count(),
            entries_by_type: self.entries.count_by_type(),
            stored_grants: self.permissions.len(),
            known_identities: self.reputation.known_identities(),
            audit_records,
        }
    }
}

impl Default for VaultState {
    fn default() -> Self {
        Self::new(&ReputationConfig::default())
    }
}
