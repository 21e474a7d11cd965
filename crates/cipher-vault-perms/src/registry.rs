//! The permission registry.
//!
//! Holds every grant keyed by (entry, grantee) and answers authorization
//! questions against an entry record supplied by the caller. The registry
//! never owns entries; ownership and visibility come from the
//! [`VaultEntry`] passed in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use cipher_vault_core::{EntryId, Identity, Timestamp, VaultEntry};

use crate::error::{PermsError, Result};
use crate::grant::{PermissionGrant, PermissionLevel};

/// All grants, indexed two ways.
#[derive(Debug, Default, Clone)]
pub struct PermissionRegistry {
    /// entry -> grantee -> grant. Ordered so listings come out by entry id.
    grants: BTreeMap<EntryId, BTreeMap<Identity, PermissionGrant>>,

    /// Index: grantee -> entries they hold a stored grant on.
    by_grantee: HashMap<Identity, BTreeSet<EntryId>>,
}

impl PermissionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Check whether `actor` may act on `entry` at `required` level.
    ///
    /// True for the owner, for anyone reading a public entry, and for holders
    /// of an unexpired grant at or above `required`.
    pub fn is_authorized(
        &self,
        actor: &Identity,
        entry: &VaultEntry,
        required: PermissionLevel,
        now: Timestamp,
    ) -> bool {
        if entry.is_owned_by(actor) {
            return true;
        }
        if entry.is_public && required == PermissionLevel::Read {
            return true;
        }
        self.active_grant(actor, entry.id, now)
            .map_or(false, |grant| grant.level.satisfies(required))
    }

    /// Like [`is_authorized`](Self::is_authorized) but as a `Result`.
    pub fn check(
        &self,
        actor: &Identity,
        entry: &VaultEntry,
        required: PermissionLevel,
        now: Timestamp,
    ) -> Result<()> {
        if self.is_authorized(actor, entry, required, now) {
            Ok(())
        } else {
            Err(PermsError::Unauthorized {
                actor: *actor,
                entry_id: entry.id,
                required,
            })
        }
    }

    /// Grant and revoke both need ownership or an active Admin grant.
    pub fn check_admin(&self, actor: &Identity, entry: &VaultEntry, now: Timestamp) -> Result<()> {
        self.check(actor, entry, PermissionLevel::Admin, now)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `level` on `entry` to `grantee` for `duration` seconds (0 = forever).
    ///
    /// Overwrites any existing grant for the same pair.
    pub fn grant(
        &mut self,
        actor: &Identity,
        grantee: Identity,
        entry: &VaultEntry,
        level: PermissionLevel,
        duration: u64,
        now: Timestamp,
    ) -> Result<PermissionGrant> {
        self.check_admin(actor, entry, now)?;
        let grant = PermissionGrant::issue(entry.id, grantee, level, *actor, now, duration);
        self.insert(grant.clone());
        Ok(grant)
    }

    /// Remove `grantee`'s grant on `entry`. Absent grants are not an error.
    pub fn revoke(
        &mut self,
        actor: &Identity,
        grantee: &Identity,
        entry: &VaultEntry,
        now: Timestamp,
    ) -> Result<Option<PermissionGrant>> {
        self.check_admin(actor, entry, now)?;
        Ok(self.remove(entry.id, grantee))
    }

    /// Store a grant without any authorization check.
    ///
    /// Callers must have authorized the grant already.
    pub fn insert(&mut self, grant: PermissionGrant) -> Option<PermissionGrant> {
        self.by_grantee
            .entry(grant.grantee)
            .or_default()
            .insert(grant.entry_id);
        self.grants
            .entry(grant.entry_id)
            .or_default()
            .insert(grant.grantee, grant)
    }

    /// Drop a grant without any authorization check.
    pub fn remove(&mut self, entry_id: EntryId, grantee: &Identity) -> Option<PermissionGrant> {
        let per_entry = self.grants.get_mut(&entry_id)?;
        let removed = per_entry.remove(grantee)?;
        if per_entry.is_empty() {
            self.grants.remove(&entry_id);
        }
        if let Some(entries) = self.by_grantee.get_mut(grantee) {
            entries.remove(&entry_id);
            if entries.is_empty() {
                self.by_grantee.remove(grantee);
            }
        }
        Some(removed)
    }

    /// Delete every grant that has lapsed by `now`. Returns how many went.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let lapsed: Vec<(EntryId, Identity)> = self
            .grants
            .values()
            .flat_map(|per_entry| per_entry.values())
            .filter(|grant| !grant.is_active(now))
            .map(|grant| (grant.entry_id, grant.grantee))
            .collect();

        for (entry_id, grantee) in &lapsed {
            self.remove(*entry_id, grantee);
        }
        lapsed.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The stored grant for a pair, lapsed or not.
    pub fn get(&self, entry_id: EntryId, grantee: &Identity) -> Option<&PermissionGrant> {
        self.grants.get(&entry_id)?.get(grantee)
    }

    /// The grant for a pair, if it is still active at `now`.
    pub fn active_grant(
        &self,
        grantee: &Identity,
        entry_id: EntryId,
        now: Timestamp,
    ) -> Option<&PermissionGrant> {
        self.get(entry_id, grantee).filter(|g| g.is_active(now))
    }

    /// Active grants held by `actor`, ascending by entry id.
    ///
    /// Lapsed grants are skipped but stay stored.
    pub fn list_permissions(&self, actor: &Identity, now: Timestamp) -> Vec<&PermissionGrant> {
        self.by_grantee
            .get(actor)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry_id| self.active_grant(actor, *entry_id, now))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bitmask of the levels `actor` currently holds anywhere.
    ///
    /// Read sets bit 0, Write bit 1, Admin bit 2.
    pub fn permission_mask(&self, actor: &Identity, now: Timestamp) -> u32 {
        self.list_permissions(actor, now)
            .iter()
            .fold(0, |mask, grant| mask | grant.level.mask_bit())
    }

    /// Every stored grant on an entry, lapsed ones included.
    pub fn grants_on(&self, entry_id: EntryId) -> Vec<&PermissionGrant> {
        self.grants
            .get(&entry_id)
            .map(|per_entry| per_entry.values().collect())
            .unwrap_or_default()
    }

    /// Number of stored grants.
    pub fn len(&self) -> usize {
        self.grants.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
