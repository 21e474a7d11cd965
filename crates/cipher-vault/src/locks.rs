//! Per-entry request serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use cipher_vault_core::EntryId;

type Table = Arc<Mutex<HashMap<EntryId, Arc<AsyncMutex<()>>>>>;

/// One async mutex per entry id, present only while someone holds or waits
/// for it.
///
/// A guard is held from authorization until the commit lands, so requests on
/// the same entry run one at a time while different entries proceed in
/// parallel.
#[derive(Debug, Default)]
pub(crate) struct EntryLocks {
    table: Table,
}

/// Exclusive access to one entry. Releasing the last interest in an entry
/// removes its mutex from the table.
#[derive(Debug)]
pub(crate) struct EntryGuard {
    table: Table,
    entry_id: EntryId,
    guard: Option<OwnedMutexGuard<()>>,
}

/// Interest in an entry's mutex held across the wait, so a cancelled
/// acquire still prunes.
struct Waiter {
    table: Table,
    entry_id: EntryId,
    handle: Option<Arc<AsyncMutex<()>>>,
}

impl EntryLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `entry_id`.
    pub(crate) async fn acquire(&self, entry_id: EntryId) -> EntryGuard {
        let handle = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(entry_id).or_default())
        };
        let waiter = Waiter {
            table: Arc::clone(&self.table),
            entry_id,
            handle: Some(Arc::clone(&handle)),
        };

        let guard = handle.lock_owned().await;
        drop(waiter);

        EntryGuard {
            table: Arc::clone(&self.table),
            entry_id,
            guard: Some(guard),
        }
    }

    /// Entries with a live mutex.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Drop `held` and remove the entry's mutex if nobody else references it.
///
/// Handles are only cloned under the table lock, so the count read here
/// cannot race with a new acquire.
fn release<T>(table: &Table, entry_id: EntryId, held: T) {
    let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
    drop(held);
    let idle = table
        .get(&entry_id)
        .map_or(false, |handle| Arc::strong_count(handle) == 1);
    if idle {
        table.remove(&entry_id);
    }
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        release(&self.table, self.entry_id, self.guard.take());
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        release(&self.table, self.entry_id, self.handle.take());
    }
}
