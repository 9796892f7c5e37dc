//! Content-hash keyed lookup table with clash-chain resolution
//!
//! The primary id for a value is its fixed-width content hash. Two distinct
//! values can share a hash; when that happens the later value's id extends
//! to `[hash][u32 clash-seq]` and the configured clash hook fires so the
//! store owner can commit eagerly (a clash entry must be durable before any
//! key referencing it). Ids are therefore variable-length and callers treat
//! them opaquely.
//!
//! Unlike direct and uid encodings, a hash id never grows with the value, so
//! this table has no key-size ceiling tied to the primary store's limit.

use crate::env::{ReadOps, WriteTxn};
use crate::hash::HashFactory;
use byteorder::{BigEndian, ByteOrder};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback invoked when interning creates a clash-chain entry
pub type HashClashHook = Arc<dyn Fn() + Send + Sync>;

/// Maximum id width: hash plus clash sequence
const MAX_ID_LEN: usize = 12;

/// Content-hash keyed lookup table
#[derive(Clone)]
pub struct HashLookupDb {
    table: String,
    used_table: String,
    factory: HashFactory,
    clash_hook: Option<HashClashHook>,
}

impl std::fmt::Debug for HashLookupDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashLookupDb")
            .field("table", &self.table)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl HashLookupDb {
    /// Create a handle over the `{name}` lookup namespace
    pub fn new(name: &str, factory: HashFactory, clash_hook: Option<HashClashHook>) -> Self {
        HashLookupDb {
            table: format!("{name}/hash"),
            used_table: format!("{name}/hash/used"),
            factory,
            clash_hook,
        }
    }

    fn id_for_seq(&self, hash: &[u8], seq: u32) -> SmallVec<[u8; MAX_ID_LEN]> {
        let mut id = SmallVec::from_slice(hash);
        if seq > 0 {
            let mut ext = [0u8; 4];
            BigEndian::write_u32(&mut ext, seq);
            id.extend_from_slice(&ext);
        }
        id
    }

    /// Intern `value`, returning its id
    ///
    /// Walks the clash chain for the value's hash until it finds the value
    /// itself or a free slot. Idempotent for identical values.
    pub fn put(&self, txn: &mut WriteTxn<'_>, value: &[u8]) -> SmallVec<[u8; MAX_ID_LEN]> {
        let hash = self.factory.hash(value);
        let mut seq = 0u32;
        loop {
            let id = self.id_for_seq(&hash, seq);
            // Probe first, then mutate: the slot state decides the action.
            let slot = txn.get(&self.table, &id).map(|existing| existing == value);
            match slot {
                None => {
                    txn.put(&self.table, id.to_vec(), value.to_vec());
                    if seq > 0 {
                        warn!(
                            target: "tempokv::lookup",
                            seq,
                            len = value.len(),
                            "hash clash, extended id issued"
                        );
                        if let Some(hook) = &self.clash_hook {
                            hook();
                        }
                    } else {
                        debug!(target: "tempokv::lookup", len = value.len(), "interned by hash");
                    }
                    return id;
                }
                Some(true) => return id,
                Some(false) => seq += 1,
            }
        }
    }

    /// Get the id for `value` without interning it
    pub fn get(&self, txn: &dyn ReadOps, value: &[u8]) -> Option<SmallVec<[u8; MAX_ID_LEN]>> {
        let hash = self.factory.hash(value);
        let mut seq = 0u32;
        loop {
            let id = self.id_for_seq(&hash, seq);
            match txn.get(&self.table, &id) {
                None => return None,
                Some(existing) if existing == value => return Some(id),
                Some(_) => seq += 1,
            }
        }
    }

    /// Get the value bytes an id refers to
    pub fn get_value<'a>(&self, txn: &'a dyn ReadOps, id: &[u8]) -> Option<&'a [u8]> {
        txn.get(&self.table, id)
    }

    /// Number of interned values (clash-chain entries included)
    pub fn entry_count(&self, txn: &dyn ReadOps) -> usize {
        txn.entry_count(&self.table)
    }

    /// Stage an id as still referenced by a live key
    pub fn record_used(&self, txn: &mut WriteTxn<'_>, id: &[u8]) {
        txn.put(&self.used_table, id.to_vec(), Vec::new());
    }

    /// Delete every entry whose id was not staged, then reset the staging
    /// table; returns the number of entries deleted
    pub fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> usize {
        let mut unused: Vec<Vec<u8>> = Vec::new();
        txn.for_each(&self.table, &mut |id, _| {
            unused.push(id.to_vec());
            true
        });
        unused.retain(|id| !txn.contains(&self.used_table, id));

        for id in &unused {
            txn.delete(&self.table, id);
        }
        txn.clear(&self.used_table);
        debug!(target: "tempokv::lookup", deleted = unused.len(), "hash sweep complete");
        unused.len()
    }
}
