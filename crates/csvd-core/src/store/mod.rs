//! Concurrent name → table registry.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     TableStore                        │
//! │                                                       │
//! │   DashMap<TableName, Arc<Slot>>   (sharded)           │
//! │      │                                                │
//! │      ├── "AbC..." ──► Slot { committed, writer }      │
//! │      ├── "frame1" ──► Slot { committed, writer }      │
//! │      └── ...                                          │
//! │                                                       │
//! │   DiskStore (optional)  <data_dir>/<name>.csv         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Shard locks are held only long enough to find or create a slot. Writers of
//! one name serialize on that slot's writer lock, which also covers the disk
//! write, so the file on disk always matches the last committed table.
//! Readers clone the committed `Arc<Table>` and never wait on writers of other
//! names.

mod disk;
mod slot;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::name::TableName;
use crate::table::Table;

use self::disk::DiskStore;
use self::slot::Slot;

/// Whether a put created a new table or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No table was committed under the name before.
    Created,
    /// A previous table was replaced.
    Replaced,
}

/// Store statistics.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Number of committed tables.
    pub table_count: usize,
    /// Total rows across all committed tables.
    pub total_rows: usize,
    /// Successful puts since startup.
    pub puts: u64,
    /// Lookups since startup.
    pub gets: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Time since the store was opened.
    pub uptime: Duration,
}

/// The table registry.
#[derive(Debug)]
pub struct TableStore {
    config: StoreConfig,
    slots: DashMap<TableName, Arc<Slot>>,
    disk: Option<DiskStore>,
    puts: AtomicU64,
    gets: AtomicU64,
    misses: AtomicU64,
    opened_at: Instant,
}

impl TableStore {
    /// Opens a store, loading persisted tables if a data directory is set.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let slots = DashMap::new();

        let disk = match &config.data_dir {
            Some(dir) => {
                let (disk, tables) = DiskStore::open(dir)?;
                tracing::info!("Loaded {} tables from {:?}", tables.len(), dir);
                for (name, table) in tables {
                    let slot = Slot::default();
                    slot.commit(Arc::new(table));
                    slots.insert(name, Arc::new(slot));
                }
                Some(disk)
            }
            None => None,
        };

        Ok(Self {
            config,
            slots,
            disk,
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            opened_at: Instant::now(),
        })
    }

    /// Creates an empty memory-only store.
    pub fn in_memory() -> Self {
        Self {
            config: StoreConfig::in_memory(),
            slots: DashMap::new(),
            disk: None,
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            opened_at: Instant::now(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the data directory, if tables are persisted.
    pub fn data_dir(&self) -> Option<&Path> {
        self.disk.as_ref().map(DiskStore::dir)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Installs `table` under `name`, replacing any previous table.
    ///
    /// The table becomes visible to readers only once fully committed (and
    /// written to disk in persistent mode). On error the previous table, if
    /// any, stays in place.
    pub fn put(&self, name: &TableName, table: Table) -> StoreResult<PutOutcome> {
        let table = Arc::new(table);
        loop {
            let slot = self.slot_for(name);
            let retired = slot.lock_writer();
            if *retired {
                continue;
            }

            if let Some(disk) = &self.disk {
                disk.write(name, &table)?;
            }
            let previous = slot.commit(table);
            drop(retired);

            self.puts.fetch_add(1, Ordering::Relaxed);
            let outcome = match previous {
                Some(_) => PutOutcome::Replaced,
                None => PutOutcome::Created,
            };
            tracing::debug!(table = %name, ?outcome, "committed table");
            return Ok(outcome);
        }
    }

    /// Stores `table` under a freshly generated name and returns the name.
    ///
    /// The name is reserved atomically, so concurrent callers never receive
    /// the same name and never overwrite a client-named table.
    pub fn insert_generated(&self, table: Table) -> StoreResult<TableName> {
        let mut rng = rand::thread_rng();

        for _ in 0..self.config.max_name_attempts {
            let name = TableName::random(&mut rng);

            // Locked before it is published, so no put can commit ahead of us.
            let slot = Arc::new(Slot::default());
            let mut retired = slot.lock_writer();
            match self.slots.entry(name.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::clone(&slot));
                }
            }

            if let Some(disk) = &self.disk {
                if let Err(e) = disk.write(&name, &table) {
                    self.slots.remove_if(&name, |_, s| Arc::ptr_eq(s, &slot));
                    *retired = true;
                    return Err(e);
                }
            }
            slot.commit(Arc::new(table));
            drop(retired);

            self.puts.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(table = %name, "committed table under generated name");
            return Ok(name);
        }

        Err(StoreError::NameSpaceExhausted {
            attempts: self.config.max_name_attempts,
        })
    }

    /// Removes the table stored under `name`.
    pub fn remove(&self, name: &TableName) -> StoreResult<Arc<Table>> {
        loop {
            let Some(slot) = self.slots.get(name).map(|s| Arc::clone(s.value())) else {
                return Err(self.not_found(name));
            };

            let mut retired = slot.lock_writer();
            if *retired {
                continue;
            }
            if !slot.is_committed() {
                return Err(self.not_found(name));
            }

            if let Some(disk) = &self.disk {
                disk.remove(name)?;
            }
            self.slots.remove_if(name, |_, s| Arc::ptr_eq(s, &slot));
            *retired = true;

            let table = slot.take().ok_or_else(|| self.not_found(name))?;
            tracing::debug!(table = %name, "removed table");
            return Ok(table);
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the most recently committed table for `name`.
    pub fn get(&self, name: &str) -> StoreResult<Arc<Table>> {
        self.gets.fetch_add(1, Ordering::Relaxed);

        let slot = self.slots.get(name).map(|s| Arc::clone(s.value()));
        match slot.and_then(|s| s.load()) {
            Some(table) => Ok(table),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::NotFound {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Returns true if a table is committed under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .map_or(false, |slot| slot.is_committed())
    }

    /// Returns a name not currently used in the store.
    ///
    /// The name is not reserved; use [`TableStore::insert_generated`] to
    /// generate and store in one step.
    pub fn generate_name(&self) -> StoreResult<TableName> {
        let mut rng = rand::thread_rng();
        for _ in 0..self.config.max_name_attempts {
            let name = TableName::random(&mut rng);
            if !self.slots.contains_key(&name) {
                return Ok(name);
            }
        }
        Err(StoreError::NameSpaceExhausted {
            attempts: self.config.max_name_attempts,
        })
    }

    /// Lists committed table names in sorted order.
    pub fn list(&self) -> Vec<TableName> {
        let mut names: Vec<TableName> = self
            .slots
            .iter()
            .filter(|entry| entry.value().is_committed())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Returns the number of committed tables.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().is_committed())
            .count()
    }

    /// Returns true if no table is committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut table_count = 0;
        let mut total_rows = 0;
        for entry in self.slots.iter() {
            if let Some(table) = entry.value().load() {
                table_count += 1;
                total_rows += table.num_rows();
            }
        }

        StoreStats {
            table_count,
            total_rows,
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            uptime: self.opened_at.elapsed(),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn slot_for(&self, name: &TableName) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(name) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(name.clone()).or_default().value())
    }

    fn not_found(&self, name: &TableName) -> StoreError {
        StoreError::NotFound {
            name: name.to_string(),
        }
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
