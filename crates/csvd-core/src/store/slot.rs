//! Per-name storage cell.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::table::Table;

/// Holds the committed table for one name.
///
/// Readers only touch `committed`. Writers of the same name serialize on
/// `writer`, whose guarded flag is set once the slot has been unlinked from
/// the store by a delete; a writer that finds it set must look the name up
/// again.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    committed: RwLock<Option<Arc<Table>>>,
    writer: Mutex<bool>,
}

impl Slot {
    /// Returns the committed table, if any write has completed.
    pub(crate) fn load(&self) -> Option<Arc<Table>> {
        self.committed.read().clone()
    }

    /// Returns true if a table has been committed.
    pub(crate) fn is_committed(&self) -> bool {
        self.committed.read().is_some()
    }

    /// Acquires the writer lock. The guarded value is the retired flag.
    pub(crate) fn lock_writer(&self) -> MutexGuard<'_, bool> {
        self.writer.lock()
    }

    /// Publishes `table`, returning the value it replaced.
    pub(crate) fn commit(&self, table: Arc<Table>) -> Option<Arc<Table>> {
        self.committed.write().replace(table)
    }

    /// Clears the slot, returning the committed value.
    pub(crate) fn take(&self) -> Option<Arc<Table>> {
        self.committed.write().take()
    }
}
