//! Bidirectional value ↔ uid lookup table
//!
//! Uids are 8-byte big-endian integers issued from a persistent sequence.
//! The table is bidirectional: a forward table maps value bytes to the uid
//! and a reverse table maps the uid back to the value bytes. `put` is
//! idempotent - re-putting an identical value returns the existing uid and
//! leaves the table untouched.

use crate::env::{ReadOps, WriteTxn};
use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

/// Fixed uid width in bytes
pub const UID_LEN: usize = 8;

const NEXT_ID_KEY: &[u8] = b"next_id";

/// Bidirectional value ↔ uid lookup table
///
/// Holds only table names; all state lives in the environment, so the
/// handle is freely cloneable and shareable.
#[derive(Debug, Clone)]
pub struct UidLookupDb {
    fwd_table: String,
    rev_table: String,
    meta_table: String,
    used_table: String,
}

impl UidLookupDb {
    /// Create a handle over the `{name}` lookup namespace
    pub fn new(name: &str) -> Self {
        UidLookupDb {
            fwd_table: format!("{name}/uid/fwd"),
            rev_table: format!("{name}/uid/rev"),
            meta_table: format!("{name}/uid/meta"),
            used_table: format!("{name}/uid/used"),
        }
    }

    /// Intern `value`, returning its uid
    ///
    /// Issues a fresh uid only for a previously-unseen value; an identical
    /// value always maps to the same uid.
    pub fn put(&self, txn: &mut WriteTxn<'_>, value: &[u8]) -> [u8; UID_LEN] {
        if let Some(existing) = txn.get(&self.fwd_table, value) {
            let mut uid = [0u8; UID_LEN];
            uid.copy_from_slice(existing);
            return uid;
        }

        // Uids start at 1 so a zeroed buffer never aliases a live entry.
        let next = txn
            .get(&self.meta_table, NEXT_ID_KEY)
            .map_or(1, BigEndian::read_u64);
        let mut uid = [0u8; UID_LEN];
        BigEndian::write_u64(&mut uid, next);

        txn.put(&self.fwd_table, value.to_vec(), uid.to_vec());
        txn.put(&self.rev_table, uid.to_vec(), value.to_vec());
        txn.put(
            &self.meta_table,
            NEXT_ID_KEY.to_vec(),
            (next + 1).to_be_bytes().to_vec(),
        );
        debug!(target: "tempokv::lookup", uid = next, len = value.len(), "issued uid");
        uid
    }

    /// Get the uid for `value` without interning it
    pub fn get(&self, txn: &dyn ReadOps, value: &[u8]) -> Option<[u8; UID_LEN]> {
        txn.get(&self.fwd_table, value).map(|bytes| {
            let mut uid = [0u8; UID_LEN];
            uid.copy_from_slice(bytes);
            uid
        })
    }

    /// Get the value bytes a uid refers to
    pub fn get_value<'a>(&self, txn: &'a dyn ReadOps, uid: &[u8]) -> Option<&'a [u8]> {
        txn.get(&self.rev_table, uid)
    }

    /// Number of interned values
    pub fn entry_count(&self, txn: &dyn ReadOps) -> usize {
        txn.entry_count(&self.rev_table)
    }

    /// Stage a uid as still referenced by a live key
    pub fn record_used(&self, txn: &mut WriteTxn<'_>, uid: &[u8]) {
        txn.put(&self.used_table, uid.to_vec(), Vec::new());
    }

    /// Delete every entry whose uid was not staged, then reset the staging
    /// table; returns the number of entries deleted
    ///
    /// The uid sequence is never rewound: a reclaimed uid is retired, not
    /// reissued.
    pub fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> usize {
        let mut unused: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        txn.for_each(&self.rev_table, &mut |uid, value| {
            unused.push((uid.to_vec(), value.to_vec()));
            true
        });
        unused.retain(|(uid, _)| !txn.contains(&self.used_table, uid));

        for (uid, value) in &unused {
            txn.delete(&self.rev_table, uid);
            txn.delete(&self.fwd_table, value);
        }
        txn.clear(&self.used_table);
        debug!(target: "tempokv::lookup", deleted = unused.len(), "uid sweep complete");
        unused.len()
    }
}
