//! AuditStore trait: the abstract interface for audit persistence.
//!
//! This trait keeps the vault storage-agnostic. Implementations include
//! SQLite (durable) and in-memory (for tests and ephemeral vaults).

use std::sync::Arc;

use async_trait::async_trait;
use cipher_vault_core::{AuditFilter, AuditRecord, LogId, NewAuditRecord};

use crate::error::Result;

/// The AuditStore trait: async interface for the append-only audit trail.
///
/// All methods are async to support both blocking (SQLite) and async
/// backends. For SQLite, `spawn_blocking` keeps the runtime free.
///
/// # Design Notes
///
/// - **Id assignment**: `append` assigns the next [`LogId`] inside the
///   store's own critical section. Ids start at 1 and have no gaps.
/// - **All or nothing**: if `append` returns an error, no record was written
///   and no id was consumed.
/// - **Append-only**: there is no update or delete operation.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a record and return the id it was assigned.
    async fn append(&self, record: &NewAuditRecord) -> Result<LogId>;

    /// Get a record by id.
    async fn get(&self, log_id: LogId) -> Result<Option<AuditRecord>>;

    /// Fetch up to `limit` matching records with `log_id > after`, ascending.
    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<LogId>,
        limit: usize,
    ) -> Result<Vec<AuditRecord>>;

    /// Number of records in the store.
    async fn len(&self) -> Result<u64>;

    /// Id of the most recent record, if any.
    async fn head(&self) -> Result<Option<LogId>>;
}

#[async_trait]
impl<S: AuditStore + ?Sized> AuditStore for Arc<S> {
    async fn append(&self, record: &NewAuditRecord) -> Result<LogId> {
        (**self).append(record).await
    }

    async fn get(&self, log_id: LogId) -> Result<Option<AuditRecord>> {
        (**self).get(log_id).await
    }

    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<LogId>,
        limit: usize,
    ) -> Result<Vec<AuditRecord>> {
        (**self).scan(filter, after, limit).await
    }

    async fn len(&self) -> Result<u64> {
        (**self).len().await
    }

    async fn head(&self) -> Result<Option<LogId>> {
        (**self).head().await
    }
}
