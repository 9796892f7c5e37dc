//! Ordered in-memory store environment
//!
//! The environment holds a set of named tables, each an ordered map of byte
//! keys to byte values, behind one `parking_lot::RwLock`. Transactions are
//! guard-backed:
//!
//! - `ReadTxn` wraps a read guard; any number may be live at once.
//! - `WriteTxn` wraps the write guard; the lock admits exactly one, and the
//!   guard type is not `Send`, so the single-writer discipline the encoding
//!   layer depends on is enforced by construction rather than convention.
//!
//! Serde code that only reads accepts `&dyn ReadOps`, which both transaction
//! types implement, so decode paths run identically inside read and write
//! transactions.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Debug, Default)]
struct EnvInner {
    tables: FxHashMap<String, Table>,
}

/// Ordered in-memory store: named tables behind a single-writer lock
#[derive(Debug, Default)]
pub struct Env {
    inner: RwLock<EnvInner>,
}

impl Env {
    /// Create an empty environment
    pub fn new() -> Arc<Self> {
        Arc::new(Env::default())
    }

    /// Run a closure inside a read transaction
    pub fn read<R>(&self, f: impl FnOnce(&ReadTxn<'_>) -> R) -> R {
        let txn = self.begin_read();
        f(&txn)
    }

    /// Run a closure inside the write transaction
    pub fn write<R>(&self, f: impl FnOnce(&mut WriteTxn<'_>) -> R) -> R {
        let mut txn = self.begin_write();
        f(&mut txn)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> ReadTxn<'_> {
        ReadTxn {
            guard: self.inner.read(),
        }
    }

    /// Begin the write transaction, blocking until exclusive
    pub fn begin_write(&self) -> WriteTxn<'_> {
        WriteTxn {
            guard: self.inner.write(),
            change_count: 0,
        }
    }
}

/// Read access shared by read and write transactions
pub trait ReadOps {
    /// Get the value stored under `key` in `table`
    fn get<'a>(&'a self, table: &str, key: &[u8]) -> Option<&'a [u8]>;

    /// Number of entries in `table`
    fn entry_count(&self, table: &str) -> usize;

    /// Visit every entry of `table` in key order until the visitor returns
    /// `false`
    fn for_each(&self, table: &str, f: &mut dyn FnMut(&[u8], &[u8]) -> bool);

    /// Whether `table` contains `key`
    fn contains(&self, table: &str, key: &[u8]) -> bool {
        self.get(table, key).is_some()
    }
}

fn table_get<'a>(inner: &'a EnvInner, table: &str, key: &[u8]) -> Option<&'a [u8]> {
    inner.tables.get(table)?.get(key).map(Vec::as_slice)
}

fn table_len(inner: &EnvInner, table: &str) -> usize {
    inner.tables.get(table).map_or(0, BTreeMap::len)
}

fn table_for_each(inner: &EnvInner, table: &str, f: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
    if let Some(t) = inner.tables.get(table) {
        for (k, v) in t.iter() {
            if !f(k, v) {
                break;
            }
        }
    }
}

/// Read transaction
pub struct ReadTxn<'e> {
    guard: RwLockReadGuard<'e, EnvInner>,
}

impl ReadOps for ReadTxn<'_> {
    fn get<'a>(&'a self, table: &str, key: &[u8]) -> Option<&'a [u8]> {
        table_get(&self.guard, table, key)
    }

    fn entry_count(&self, table: &str) -> usize {
        table_len(&self.guard, table)
    }

    fn for_each(&self, table: &str, f: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
        table_for_each(&self.guard, table, f)
    }
}

/// Write transaction
///
/// Exactly one exists at a time. Holding it grants read access too, so
/// lookup-table reads during an encode run against the writer's own view.
pub struct WriteTxn<'e> {
    guard: RwLockWriteGuard<'e, EnvInner>,
    change_count: u64,
}

impl WriteTxn<'_> {
    /// Insert or replace an entry; returns true when the key was new
    pub fn put(&mut self, table: &str, key: Vec<u8>, value: Vec<u8>) -> bool {
        self.change_count += 1;
        self.guard
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(key, value)
            .is_none()
    }

    /// Delete an entry; returns true when it existed
    pub fn delete(&mut self, table: &str, key: &[u8]) -> bool {
        let existed = self
            .guard
            .tables
            .get_mut(table)
            .map_or(false, |t| t.remove(key).is_some());
        if existed {
            self.change_count += 1;
        }
        existed
    }

    /// Remove every entry of `table`
    pub fn clear(&mut self, table: &str) {
        if let Some(t) = self.guard.tables.get_mut(table) {
            self.change_count += t.len() as u64;
            t.clear();
        }
    }

    /// Number of mutations applied through this transaction
    pub fn change_count(&self) -> u64 {
        self.change_count
    }
}

impl ReadOps for WriteTxn<'_> {
    fn get<'a>(&'a self, table: &str, key: &[u8]) -> Option<&'a [u8]> {
        table_get(&self.guard, table, key)
    }

    fn entry_count(&self, table: &str) -> usize {
        table_len(&self.guard, table)
    }

    fn for_each(&self, table: &str, f: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
        table_for_each(&self.guard, table, f)
    }
}
