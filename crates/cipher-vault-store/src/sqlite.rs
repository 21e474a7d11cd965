//! SQLite implementation of the AuditStore trait.
//!
//! The durable backend for the audit trail. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use cipher_vault_core::{
    Action, AuditFilter, AuditOutcome, AuditRecord, EntryId, Identity, LogId, NewAuditRecord,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::AuditStore;

/// SQLite-based audit store.
///
/// Thread-safe via an internal Mutex. All operations run on the blocking
/// pool so the async runtime is never stalled by disk I/O.
pub struct SqliteAuditStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

// Helper to convert a row to AuditRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditRecord> {
    let actor_bytes: Vec<u8> = row.get("actor")?;
    let action: u8 = row.get("action")?;
    let outcome: u8 = row.get("outcome")?;

    let conversion = |idx: usize, ty: Type, e: cipher_vault_core::CoreError| {
        rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
    };

    Ok(AuditRecord {
        log_id: LogId(row.get::<_, i64>("log_id")? as u64),
        entry_id: EntryId(row.get::<_, i64>("entry_id")? as u64),
        actor: Identity::try_from(actor_bytes.as_slice())
            .map_err(|e| conversion(2, Type::Blob, e))?,
        action: Action::from_u8(action).map_err(|e| conversion(3, Type::Integer, e))?,
        outcome: AuditOutcome::from_u8(outcome).map_err(|e| conversion(4, Type::Integer, e))?,
        timestamp: row.get::<_, i64>("timestamp")? as u64,
    })
}

fn decode_error(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::FromSqlConversionFailure(..) => StoreError::Corrupt(e.to_string()),
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, record: &NewAuditRecord) -> Result<LogId> {
        let record = record.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let next: i64 = tx.query_row(
                "SELECT COALESCE(MAX(log_id), 0) + 1 FROM audit_log",
                [],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO audit_log (log_id, entry_id, actor, action, outcome, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    next,
                    record.entry_id.get() as i64,
                    record.actor.as_bytes().as_slice(),
                    record.action.as_u8(),
                    record.outcome.as_u8(),
                    record.timestamp as i64,
                ],
            )?;

            tx.commit()?;
            Ok(LogId(next as u64))
        })
        .await
    }

    async fn get(&self, log_id: LogId) -> Result<Option<AuditRecord>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT log_id, entry_id, actor, action, outcome, timestamp
                 FROM audit_log WHERE log_id = ?1",
                params![log_id.get() as i64],
                row_to_record,
            )
            .optional()
            .map_err(decode_error)
        })
        .await
    }

    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<LogId>,
        limit: usize,
    ) -> Result<Vec<AuditRecord>> {
        let entry_id = filter.entry_id.map(|id| id.get() as i64);
        let actor = filter.actor.map(|a| a.as_bytes().to_vec());
        let after = after.map_or(0, |id| id.get() as i64);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT log_id, entry_id, actor, action, outcome, timestamp
                 FROM audit_log
                 WHERE log_id > ?1
                   AND (?2 IS NULL OR entry_id = ?2)
                   AND (?3 IS NULL OR actor = ?3)
                 ORDER BY log_id
                 LIMIT ?4",
            )?;

            let records = stmt
                .query_map(params![after, entry_id, actor, limit], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(decode_error)?;

            Ok(records)
        })
        .await
    }

    async fn len(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn head(&self) -> Result<Option<LogId>> {
        self.with_conn(|conn| {
            let head: Option<i64> =
                conn.query_row("SELECT MAX(log_id) FROM audit_log", [], |row| row.get(0))?;
            Ok(head.map(|id| LogId(id as u64)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(entry: u64, actor: &str, action: Action, outcome: AuditOutcome) -> NewAuditRecord {
        NewAuditRecord {
            entry_id: EntryId(entry),
            actor: Identity::derive(actor),
            action,
            outcome,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_sqlite_append_and_get() {
        let store = SqliteAuditStore::open_memory().unwrap();
        let record = draft(7, "alice", Action::GrantAccess, AuditOutcome::Denied);

        let id = store.append(&record).await.unwrap();
        assert_eq!(id, LogId(1));

        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched, record.with_id(LogId(1)));
        assert!(store.get(LogId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_scan_filters() {
        let store = SqliteAuditStore::open_memory().unwrap();
        store.append(&draft(1, "alice", Action::Create, AuditOutcome::Success)).await.unwrap();
        store.append(&draft(2, "bob", Action::Create, AuditOutcome::Success)).await.unwrap();
        store.append(&draft(1, "bob", Action::Read, AuditOutcome::Denied)).await.unwrap();

        let by_bob = store
            .scan(&AuditFilter::for_actor(Identity::derive("bob")), None, 10)
            .await
            .unwrap();
        let ids: Vec<_> = by_bob.iter().map(|r| r.log_id.get()).collect();
        assert_eq!(ids, vec![2, 3]);

        let both = store
            .scan(
                &AuditFilter::for_entry(EntryId(1)).and_actor(Identity::derive("bob")),
                None,
                10,
            )
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].outcome, AuditOutcome::Denied);

        let paged = store.scan(&AuditFilter::all(), Some(LogId(1)), 1).await.unwrap();
        assert_eq!(paged[0].log_id, LogId(2));

        assert_eq!(store.len().await.unwrap(), 3);
        assert_eq!(store.head().await.unwrap(), Some(LogId(3)));
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");

        {
            let store = SqliteAuditStore::open(&path).unwrap();
            store.append(&draft(1, "alice", Action::Create, AuditOutcome::Success)).await.unwrap();
            store.append(&draft(1, "alice", Action::Delete, AuditOutcome::Success)).await.unwrap();
        }

        let store = SqliteAuditStore::open(&path).unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
        let next = store
            .append(&draft(1, "alice", Action::Delete, AuditOutcome::Success))
            .await
            .unwrap();
        assert_eq!(next, LogId(3));
    }

    #[tokio::test]
    async fn test_sqlite_empty_store() {
        let store = SqliteAuditStore::open_memory().unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(store.head().await.unwrap(), None);
        assert!(store.scan(&AuditFilter::all(), None, 10).await.unwrap().is_empty());
    }
}
