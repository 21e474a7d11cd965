//! The entry store: vault entry records keyed by sequential id.

use std::collections::BTreeMap;

use cipher_vault_core::{
    validate_data_type, validate_metadata_hash, CiphertextHandle, DataType, EntryId, EntryView,
    Identity, Timestamp, VaultEntry,
};

use crate::error::{Result, VaultError};

/// Owns every vault entry, live or deactivated.
///
/// Entries are never removed; deactivation only flips `active`. Ids come
/// from a counter that only moves forward, so an id reserved by a request
/// that later aborted is skipped rather than reused.
#[derive(Debug, Clone)]
pub struct EntryStore {
    entries: BTreeMap<EntryId, VaultEntry>,
    next_id: EntryId,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: EntryId::FIRST,
        }
    }
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id without creating anything.
    pub fn reserve_id(&mut self) -> EntryId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Store an entry built around a reserved id.
    ///
    /// Returns the previous record if the id was already in use.
    pub fn insert(&mut self, entry: VaultEntry) -> Option<VaultEntry> {
        if entry.id >= self.next_id {
            self.next_id = entry.id.next();
        }
        self.entries.insert(entry.id, entry)
    }

    /// Validate and build a new entry under a freshly reserved id.
    ///
    /// The entry is not stored; pass it to [`insert`](Self::insert).
    pub fn prepare(
        &mut self,
        owner: Identity,
        data_type: u8,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<VaultEntry> {
        let data_type = validate_data_type(data_type)?;
        validate_metadata_hash(&metadata_hash)?;
        Ok(VaultEntry {
            id: self.reserve_id(),
            owner,
            data_type,
            ciphertext_handle,
            is_public,
            metadata_hash,
            active: true,
            created_at: now,
            last_modified: now,
        })
    }

    /// Create and store a new entry in one step.
    pub fn create(
        &mut self,
        owner: Identity,
        data_type: u8,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<EntryId> {
        let entry = self.prepare(owner, data_type, ciphertext_handle, is_public, metadata_hash, now)?;
        let id = entry.id;
        self.insert(entry);
        Ok(id)
    }

    /// Replace the mutable fields of a live entry.
    ///
    /// Authorization is the caller's job.
    pub fn update(
        &mut self,
        entry_id: EntryId,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<()> {
        validate_metadata_hash(&metadata_hash)?;
        let entry = self
            .entries
            .get_mut(&entry_id)
            .filter(|e| e.active)
            .ok_or(VaultError::EntryNotFound { entry_id })?;

        entry.ciphertext_handle = ciphertext_handle;
        entry.is_public = is_public;
        entry.metadata_hash = metadata_hash;
        entry.last_modified = now;
        Ok(())
    }

    /// Mark an entry inactive. Returns whether it was live before.
    ///
    /// Deactivating an inactive entry is a no-op, not an error.
    pub fn deactivate(&mut self, entry_id: EntryId, now: Timestamp) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(&entry_id)
            .ok_or(VaultError::EntryNotFound { entry_id })?;

        if !entry.active {
            return Ok(false);
        }
        entry.active = false;
        entry.last_modified = now;
        Ok(true)
    }

    /// Any entry, live or not.
    pub fn get(&self, entry_id: EntryId) -> Option<&VaultEntry> {
        self.entries.get(&entry_id)
    }

    /// Only live entries.
    pub fn get_active(&self, entry_id: EntryId) -> Option<&VaultEntry> {
        self.get(entry_id).filter(|e| e.active)
    }

    /// Full view of a live entry, tombstone of an inactive one.
    pub fn view(&self, entry_id: EntryId) -> Option<EntryView> {
        self.get(entry_id).map(VaultEntry::view)
    }

    /// Entries ever created (and kept).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.active).count()
    }

    /// Live entries per data type. Every type is present, possibly at zero.
    pub fn count_by_type(&self) -> BTreeMap<DataType, usize> {
        let mut counts: BTreeMap<DataType, usize> =
            DataType::ALL.iter().map(|t| (*t, 0)).collect();
        for entry in self.entries.values().filter(|e| e.active) {
            *counts.entry(entry.data_type).or_default() += 1;
        }
        counts
    }

    /// Iterate entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &VaultEntry> {
        self.entries.values()
    }
}
