//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use cipher_vault::{AccessController, VaultConfig};
use cipher_vault_core::{CiphertextHandle, DataType, EntryId, Identity, ManualClock, Timestamp};
use cipher_vault_store::{AuditStore, MemoryAuditStore};

use crate::faulty::FaultyAuditStore;

/// Where every fixture clock starts.
pub const START_TIME: Timestamp = 1_700_000_000;

/// A controller on a manual clock, with the store kept at hand.
pub struct TestVault<S = MemoryAuditStore> {
    pub vault: AccessController<Arc<S>>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<S>,
}

impl TestVault<MemoryAuditStore> {
    /// In-memory store, default config.
    pub fn new() -> Self {
        Self::with_config(VaultConfig::default())
    }

    pub fn with_config(config: VaultConfig) -> Self {
        Self::with_store(MemoryAuditStore::new(), config)
    }
}

impl Default for TestVault<MemoryAuditStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVault<FaultyAuditStore> {
    /// Store whose appends can be made to fail with `store.arm()`.
    pub fn faulty() -> Self {
        Self::with_store(FaultyAuditStore::new(), VaultConfig::default())
    }
}

impl<S: AuditStore + 'static> TestVault<S> {
    pub fn with_store(store: S, config: VaultConfig) -> Self {
        let store = Arc::new(store);
        let clock = Arc::new(ManualClock::new(START_TIME));
        let vault = AccessController::with_clock(Arc::clone(&store), clock.clone(), config);
        Self {
            vault,
            clock,
            store,
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }

    /// Create an entry with a fresh handle, panicking on failure.
    pub async fn create_entry(&self, owner: Identity, data_type: DataType, is_public: bool) -> EntryId {
        self.vault
            .create_vault_entry(
                owner,
                data_type.as_u8(),
                random_handle(),
                is_public,
                format!("Qm{}", owner.to_hex()),
            )
            .await
            .expect("fixture entry creation failed")
            .value
    }

    /// Records currently in the audit store.
    pub async fn audit_len(&self) -> u64 {
        self.store.len().await.expect("audit store unreadable")
    }
}

/// Deterministic identity for a name.
pub fn identity(name: &str) -> Identity {
    Identity::derive(name)
}

/// Random identity.
pub fn random_identity() -> Identity {
    Identity::from_bytes(rand::random())
}

/// `count` distinct deterministic identities: `party-0`, `party-1`, ...
pub fn parties(count: usize) -> Vec<Identity> {
    (0..count).map(|i| identity(&format!("party-{i}"))).collect()
}

/// Handle filled with one byte.
pub fn handle(fill: u8) -> CiphertextHandle {
    CiphertextHandle::from_bytes([fill; 32])
}

/// Random handle.
pub fn random_handle() -> CiphertextHandle {
    CiphertextHandle::from_bytes(rand::random())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_entry_creation() {
        let tv = TestVault::new();
        let owner = identity("alice");
        let entry = tv.create_entry(owner, DataType::Media, true).await;

        assert_eq!(entry, EntryId(1));
        assert_eq!(tv.audit_len().await, 1);
        assert_eq!(tv.vault.now(), START_TIME);
        tv.advance(5);
        assert_eq!(tv.vault.now(), START_TIME + 5);
    }

    #[test]
    fn test_parties_are_distinct() {
        let ids = parties(3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
        assert_eq!(ids[0], identity("party-0"));
        assert_ne!(random_identity(), random_identity());
    }
}
