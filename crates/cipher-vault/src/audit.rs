//! The audit log: an append-only trail backed by an [`AuditStore`].

use std::sync::Arc;

use cipher_vault_core::{
    Action, AuditFilter, AuditOutcome, AuditRecord, EntryId, Identity, LogId, NewAuditRecord,
    Timestamp,
};
use cipher_vault_store::{AuditStore, Result as StoreResult};

/// Append and query front for an audit store.
pub struct AuditLog<S> {
    store: Arc<S>,
    page_size: usize,
}

impl<S> Clone for AuditLog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            page_size: self.page_size,
        }
    }
}

impl<S: AuditStore> AuditLog<S> {
    /// Wrap `store`. A zero page size is treated as one.
    pub fn new(store: S, page_size: usize) -> Self {
        Self::from_shared(Arc::new(store), page_size)
    }

    pub fn from_shared(store: Arc<S>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Write one record and return its id.
    pub async fn append(
        &self,
        entry_id: EntryId,
        actor: Identity,
        action: Action,
        outcome: AuditOutcome,
        timestamp: Timestamp,
    ) -> StoreResult<LogId> {
        self.append_record(&NewAuditRecord {
            entry_id,
            actor,
            action,
            outcome,
            timestamp,
        })
        .await
    }

    pub async fn append_record(&self, record: &NewAuditRecord) -> StoreResult<LogId> {
        self.store.append(record).await
    }

    /// A lazy cursor over matching records in log order.
    pub fn query(&self, filter: AuditFilter) -> AuditCursor<S> {
        AuditCursor {
            store: Arc::clone(&self.store),
            filter,
            after: None,
            page_size: self.page_size,
        }
    }

    pub async fn get(&self, log_id: LogId) -> StoreResult<Option<AuditRecord>> {
        self.store.get(log_id).await
    }

    /// Total records written.
    pub async fn len(&self) -> StoreResult<u64> {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Page-at-a-time reader over the audit trail.
///
/// The cursor remembers the last id it returned. Once it reaches the end it
/// yields `None`, but a later call picks up any records appended since, so
/// the same cursor can be polled again. [`rewind`](Self::rewind) restarts
/// from the first record.
pub struct AuditCursor<S> {
    store: Arc<S>,
    filter: AuditFilter,
    after: Option<LogId>,
    page_size: usize,
}

impl<S: AuditStore> AuditCursor<S> {
    /// Fetch the next page, or `None` when no matching records remain.
    pub async fn next_page(&mut self) -> StoreResult<Option<Vec<AuditRecord>>> {
        let page = self
            .store
            .scan(&self.filter, self.after, self.page_size)
            .await?;

        match page.last() {
            Some(last) => {
                self.after = Some(last.log_id);
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    /// Drain every remaining page.
    pub async fn collect_all(&mut self) -> StoreResult<Vec<AuditRecord>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }

    /// Start over from the beginning of the log.
    pub fn rewind(&mut self) {
        self.after = None;
    }

    /// Id of the last record handed out.
    pub fn position(&self) -> Option<LogId> {
        self.after
    }

    pub fn filter(&self) -> &AuditFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_vault_store::MemoryAuditStore;

    async fn seeded(page_size: usize) -> AuditLog<MemoryAuditStore> {
        let log = AuditLog::new(MemoryAuditStore::new(), page_size);
        let alice = Identity::derive("alice");
        let bob = Identity::derive("bob");
        for (entry, actor, action) in [
            (1, alice, Action::Create),
            (1, bob, Action::Read),
            (2, bob, Action::Create),
            (1, alice, Action::GrantAccess),
            (2, alice, Action::Update),
        ] {
            log.append(EntryId(entry), actor, action, AuditOutcome::Success, 10)
                .await
                .unwrap();
        }
        log
    }

    #[tokio::test]
    async fn test_append_assigns_gapless_ids() {
        let log = seeded(2).await;
        assert_eq!(log.len().await.unwrap(), 5);
        let id = log
            .append(EntryId(3), Identity::derive("carol"), Action::Create, AuditOutcome::Denied, 11)
            .await
            .unwrap();
        assert_eq!(id, LogId(6));
        let record = log.get(id).await.unwrap().unwrap();
        assert_eq!(record.outcome, AuditOutcome::Denied);
    }

    #[tokio::test]
    async fn test_cursor_pages_in_order() {
        let log = seeded(2).await;
        let mut cursor = log.query(AuditFilter::all());

        let first = cursor.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(cursor.position(), Some(LogId(2)));

        let rest = cursor.collect_all().await.unwrap();
        let ids: Vec<_> = rest.iter().map(|r| r.log_id.get()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(cursor.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cursor_filters() {
        let log = seeded(10).await;
        let entry_one = log.query(AuditFilter::for_entry(EntryId(1))).collect_all().await.unwrap();
        assert_eq!(entry_one.len(), 3);

        let bob_on_two = log
            .query(AuditFilter::for_entry(EntryId(2)).and_actor(Identity::derive("bob")))
            .collect_all()
            .await
            .unwrap();
        assert_eq!(bob_on_two.len(), 1);
        assert_eq!(bob_on_two[0].action, Action::Create);
    }

    #[tokio::test]
    async fn test_cursor_resumes_and_rewinds() {
        let log = seeded(3).await;
        let mut cursor = log.query(AuditFilter::all());
        assert_eq!(cursor.collect_all().await.unwrap().len(), 5);

        log.append(EntryId(9), Identity::derive("dave"), Action::Create, AuditOutcome::Success, 12)
            .await
            .unwrap();
        let fresh = cursor.collect_all().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].log_id, LogId(6));

        cursor.rewind();
        assert_eq!(cursor.collect_all().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_zero_page_size_still_progresses() {
        let log = seeded(0).await;
        let all = log.query(AuditFilter::all()).collect_all().await.unwrap();
        assert_eq!(all.len(), 5);
    }
}
