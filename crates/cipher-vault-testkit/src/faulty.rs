//! An audit store with a failure switch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use cipher_vault_core::{AuditFilter, AuditRecord, LogId, NewAuditRecord};
use cipher_vault_store::{AuditStore, MemoryAuditStore, Result, StoreError};

/// Memory-backed store whose appends fail while armed.
///
/// Reads always go through, so tests can inspect what was written.
#[derive(Debug, Default)]
pub struct FaultyAuditStore {
    inner: MemoryAuditStore,
    armed: AtomicBool,
    rejected: AtomicU64,
}

impl FaultyAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every append fail until [`disarm`](Self::disarm).
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Appends refused so far.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStore for FaultyAuditStore {
    async fn append(&self, record: &NewAuditRecord) -> Result<LogId> {
        if self.is_armed() {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected append failure".into()));
        }
        self.inner.append(record).await
    }

    async fn get(&self, log_id: LogId) -> Result<Option<AuditRecord>> {
        self.inner.get(log_id).await
    }

    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<LogId>,
        limit: usize,
    ) -> Result<Vec<AuditRecord>> {
        self.inner.scan(filter, after, limit).await
    }

    async fn len(&self) -> Result<u64> {
        self.inner.len().await
    }

    async fn head(&self) -> Result<Option<LogId>> {
        self.inner.head().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_vault_core::{Action, AuditOutcome, EntryId, Identity};

    fn draft() -> NewAuditRecord {
        NewAuditRecord {
            entry_id: EntryId(1),
            actor: Identity::derive("alice"),
            action: Action::Create,
            outcome: AuditOutcome::Success,
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn test_armed_store_writes_nothing() {
        let store = FaultyAuditStore::new();
        assert_eq!(store.append(&draft()).await.unwrap(), LogId(1));

        store.arm();
        assert!(matches!(
            store.append(&draft()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.rejected(), 1);
        assert_eq!(store.len().await.unwrap(), 1);

        store.disarm();
        assert_eq!(store.append(&draft()).await.unwrap(), LogId(2));
    }
}
