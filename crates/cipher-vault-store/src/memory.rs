//! In-memory implementation of the AuditStore trait.
//!
//! Same semantics as SQLite but keeps everything in memory with no
//! persistence.

use std::sync::RwLock;

use async_trait::async_trait;

use cipher_vault_core::{AuditFilter, AuditRecord, LogId, NewAuditRecord};

use crate::error::{Result, StoreError};
use crate::traits::AuditStore;

/// In-memory audit store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// Record `n` lives at index `n - 1`.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {}", e))
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: &NewAuditRecord) -> Result<LogId> {
        let mut records = self.records.write().map_err(poisoned)?;
        let log_id = LogId(records.len() as u64 + 1);
        records.push(record.clone().with_id(log_id));
        Ok(log_id)
    }

    async fn get(&self, log_id: LogId) -> Result<Option<AuditRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        let index = match log_id.get().checked_sub(1) {
            Some(index) => index as usize,
            None => return Ok(None),
        };
        Ok(records.get(index).cloned())
    }

    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<LogId>,
        limit: usize,
    ) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        let start = after.map_or(0, |id| id.get() as usize).min(records.len());
        Ok(records[start..]
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn len(&self) -> Result<u64> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.len() as u64)
    }

    async fn head(&self) -> Result<Option<LogId>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.last().map(|r| r.log_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_vault_core::{Action, AuditOutcome, EntryId, Identity};

    fn draft(entry: u64, actor: &str, action: Action) -> NewAuditRecord {
        NewAuditRecord {
            entry_id: EntryId(entry),
            actor: Identity::derive(actor),
            action,
            outcome: AuditOutcome::Success,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_memory_store_assigns_gapless_ids() {
        let store = MemoryAuditStore::new();
        assert_eq!(store.head().await.unwrap(), None);

        for expected in 1..=5u64 {
            let id = store.append(&draft(1, "alice", Action::Create)).await.unwrap();
            assert_eq!(id, LogId(expected));
        }

        assert_eq!(store.len().await.unwrap(), 5);
        assert_eq!(store.head().await.unwrap(), Some(LogId(5)));
        assert_eq!(store.get(LogId(3)).await.unwrap().unwrap().log_id, LogId(3));
        assert!(store.get(LogId(0)).await.unwrap().is_none());
        assert!(store.get(LogId(6)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_scan_pages_and_filters() {
        let store = MemoryAuditStore::new();
        store.append(&draft(1, "alice", Action::Create)).await.unwrap();
        store.append(&draft(2, "bob", Action::Create)).await.unwrap();
        store.append(&draft(1, "bob", Action::Read)).await.unwrap();
        store.append(&draft(1, "alice", Action::Update)).await.unwrap();

        let entry_one = store
            .scan(&AuditFilter::for_entry(EntryId(1)), None, 10)
            .await
            .unwrap();
        let ids: Vec<_> = entry_one.iter().map(|r| r.log_id.get()).collect();
        assert_eq!(ids, vec![1, 3, 4]);

        let page = store
            .scan(&AuditFilter::all(), Some(LogId(1)), 2)
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.log_id.get()).collect();
        assert_eq!(ids, vec![2, 3]);

        let past_end = store
            .scan(&AuditFilter::all(), Some(LogId(99)), 2)
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    mod paging {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_pages_reassemble_the_filtered_log(
                entries in prop::collection::vec(1u64..4, 0..40),
                page in 1usize..7,
            ) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let store = MemoryAuditStore::new();
                    for entry in &entries {
                        store.append(&draft(*entry, "alice", Action::Update)).await.unwrap();
                    }

                    let filter = AuditFilter::for_entry(EntryId(2));
                    let mut after = None;
                    let mut seen = Vec::new();
                    loop {
                        let batch = store.scan(&filter, after, page).await.unwrap();
                        prop_assert!(batch.len() <= page);
                        match batch.last() {
                            Some(last) => after = Some(last.log_id),
                            None => break,
                        }
                        seen.extend(batch);
                    }

                    let expected: Vec<u64> = entries
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| **e == 2)
                        .map(|(i, _)| i as u64 + 1)
                        .collect();
                    let got: Vec<u64> = seen.iter().map(|r| r.log_id.get()).collect();
                    prop_assert_eq!(got, expected);
                    Ok(())
                })?;
            }
        }
    }
}
