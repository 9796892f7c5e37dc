//! Lookup tables and used-lookup bookkeeping
//!
//! Interned key encodings reference entries in one of two lookup tables:
//!
//! - [`UidLookupDb`]: value ↔ monotonically-issued 8-byte uid
//! - [`HashLookupDb`]: value keyed by content hash, with clash-chain
//!   resolution
//!
//! Entries are created on first `put` of an unseen value inside a write
//! transaction and garbage-collected by a retention sweep: the sweep walks
//! the primary table recording which lookup ids are still referenced
//! (`record_used`), then asks each recorder to delete the rest
//! (`delete_unused`). The sweep driver is external to this module; the
//! recorders supplied per serde guarantee every level of indirection gets
//! traced.

mod hash_db;
mod uid;

pub use hash_db::{HashClashHook, HashLookupDb};
pub use uid::{UidLookupDb, UID_LEN};

use crate::env::WriteTxn;
use crate::error::Result;

/// Records which lookup entries are still referenced by live keys
///
/// `record_used` receives a complete encoded key and stages the lookup ids it
/// references; `delete_unused` reclaims every entry that was never staged and
/// clears the staging state for the next sweep.
pub trait UsedLookupsRecorder: Send + Sync {
    /// Stage the lookup ids referenced by `key_bytes` as still in use
    fn record_used(&self, txn: &mut WriteTxn<'_>, key_bytes: &[u8]) -> Result<()>;

    /// Delete lookup entries that were not staged; returns how many went
    fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> Result<usize>;
}

/// Recorder for serdes that store no indirection
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsedLookupsRecorder;

impl UsedLookupsRecorder for NoopUsedLookupsRecorder {
    fn record_used(&self, _txn: &mut WriteTxn<'_>, _key_bytes: &[u8]) -> Result<()> {
        Ok(())
    }

    fn delete_unused(&self, _txn: &mut WriteTxn<'_>) -> Result<usize> {
        Ok(0)
    }
}
