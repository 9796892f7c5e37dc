//! Per-value adaptive key serde
//!
//! Each value picks one of three encodings, balancing key size against
//! lookup overhead, and the choice is stamped into a leading tag byte so
//! every key is self-describing:
//!
//! - small values ride inline (`[DIRECT][value bytes][time]`) - no
//!   indirection round-trip;
//! - medium values amortize a fixed 8-byte uid reference
//!   (`[UID_LOOKUP][uid][time]`);
//! - values whose inline form would blow the primary table's key ceiling
//!   must intern by hash (`[HASH_LOOKUP][hash id][time]`) - the hash table
//!   has no key-size coupling to the primary store.
//!
//! Both thresholds are configuration (`Limits`), validated against the time
//! width at construction.

use crate::buffer::{ByteBufferPool, PooledBuf};
use crate::env::{ReadOps, WriteTxn};
use crate::error::{hex, Result, StoreError};
use crate::lookup::{HashLookupDb, UidLookupDb, UsedLookupsRecorder, UID_LEN};
use crate::serde::time::TimeSerde;
use crate::serde::val::{read_val, write_val, Additions};
use crate::serde::{scalar_prefix, split_time, TemporalKeySerde};
use std::sync::Arc;
use tempokv_core::{KeyPrefix, Limits, TemporalKey};
use tracing::error;

/// Encoding strategy tag: the first byte of every key this serde produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VariableValType {
    /// Value bytes stored inline
    Direct = 0,
    /// Value interned through the uid lookup table
    UidLookup = 1,
    /// Value interned through the hash lookup table
    HashLookup = 2,
}

impl VariableValType {
    fn from_byte(b: u8, key_bytes: &[u8]) -> Result<Self> {
        match b {
            0 => Ok(VariableValType::Direct),
            1 => Ok(VariableValType::UidLookup),
            2 => Ok(VariableValType::HashLookup),
            other => Err(StoreError::CorruptKey {
                detail: format!("unknown variable key tag {other}"),
                bytes: hex(key_bytes),
            }),
        }
    }
}

/// Adaptive key serde choosing direct, uid or hash encoding per value
pub struct VariableKeySerde {
    uid_db: UidLookupDb,
    hash_db: HashLookupDb,
    pool: Arc<ByteBufferPool>,
    time_serde: Arc<dyn TimeSerde>,
    /// Largest serialized value size stored inline
    uid_threshold: usize,
    /// Largest serialized value size interned by uid; beyond this, hash
    hash_threshold: usize,
}

impl VariableKeySerde {
    /// Create a serde over both lookup tables, thresholds from `limits`
    pub fn new(
        uid_db: UidLookupDb,
        hash_db: HashLookupDb,
        pool: Arc<ByteBufferPool>,
        time_serde: Arc<dyn TimeSerde>,
        limits: &Limits,
    ) -> Self {
        let uid_threshold = limits.uid_inline_bytes + time_serde.size();
        let hash_threshold = limits.max_key_bytes;
        VariableKeySerde {
            uid_db,
            hash_db,
            pool,
            time_serde,
            uid_threshold,
            hash_threshold,
        }
    }

    fn build_key(&self, tag: VariableValType, id: &[u8], key: &TemporalKey) -> PooledBuf {
        let size = self.time_serde.size();
        let mut buf = self.pool.take(1 + id.len() + size);
        buf[0] = tag as u8;
        buf[1..1 + id.len()].copy_from_slice(id);
        self.time_serde.write(&mut buf[1 + id.len()..], key.time);
        buf
    }

    /// Enforce the fixed uid width on a uid-tagged payload
    ///
    /// An overlong uid payload indicates a latent encoding bug, not bad user
    /// data, so it surfaces as an illegal-state decode error with the full
    /// byte dump.
    fn check_uid_payload(payload: &[u8], key_bytes: &[u8]) -> Result<()> {
        if payload.len() != UID_LEN {
            error!(
                target: "tempokv::serde",
                expected = UID_LEN,
                actual = payload.len(),
                key = %hex(key_bytes),
                "uid-tagged key has malformed payload"
            );
            return Err(StoreError::CorruptKey {
                detail: format!(
                    "uid payload is {} bytes, expected {UID_LEN}",
                    payload.len()
                ),
                bytes: hex(key_bytes),
            });
        }
        Ok(())
    }

    fn wrap_decode(e: StoreError, key_bytes: &[u8]) -> StoreError {
        // The variant tag makes corrupt keys hard to diagnose without the
        // raw bytes, so every decode failure carries the complete dump.
        StoreError::CorruptKey {
            detail: e.to_string(),
            bytes: hex(key_bytes),
        }
    }
}

impl TemporalKeySerde for VariableKeySerde {
    fn write(&self, txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf> {
        let val = scalar_prefix(key, "scalar")?;
        let time_size = self.time_serde.size();
        // Lay the value out with slots for the tag and suffix already
        // reserved: the direct path stamps them in place, copy-free.
        let mut buf = write_val(&self.pool, val, Additions::new(1, time_size));
        let value_size = buf.len() - 1 - time_size;

        if value_size <= self.uid_threshold {
            buf[0] = VariableValType::Direct as u8;
            let split = 1 + value_size;
            self.time_serde.write(&mut buf[split..], key.time);
            return Ok(buf);
        }

        let stripped = &buf[1..1 + value_size];
        if value_size <= self.hash_threshold {
            let id = self.uid_db.put(txn, stripped);
            Ok(self.build_key(VariableValType::UidLookup, &id, key))
        } else {
            let id = self.hash_db.put(txn, stripped);
            Ok(self.build_key(VariableValType::HashLookup, &id, key))
        }
    }

    fn read(&self, txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey> {
        let Some(&tag_byte) = bytes.first() else {
            return Err(StoreError::CorruptKey {
                detail: "empty key".to_string(),
                bytes: String::new(),
            });
        };
        let tag = VariableValType::from_byte(tag_byte, bytes)?;
        let (payload, time) = split_time(&bytes[1..], self.time_serde.as_ref())?;

        let val = match tag {
            VariableValType::Direct => {
                read_val(payload).map_err(|e| Self::wrap_decode(e, bytes))?
            }
            VariableValType::UidLookup => {
                Self::check_uid_payload(payload, bytes)?;
                let value_bytes = self
                    .uid_db
                    .get_value(txn, payload)
                    .ok_or(StoreError::LookupMiss { id: hex(payload) })
                    .map_err(|e| Self::wrap_decode(e, bytes))?;
                read_val(value_bytes).map_err(|e| Self::wrap_decode(e, bytes))?
            }
            VariableValType::HashLookup => {
                let value_bytes = self
                    .hash_db
                    .get_value(txn, payload)
                    .ok_or(StoreError::LookupMiss { id: hex(payload) })
                    .map_err(|e| Self::wrap_decode(e, bytes))?;
                read_val(value_bytes).map_err(|e| Self::wrap_decode(e, bytes))?
            }
        };
        Ok(TemporalKey::new(KeyPrefix::Value(val), time))
    }

    fn to_buffer_for_get(
        &self,
        txn: &dyn ReadOps,
        key: &TemporalKey,
    ) -> Result<Option<PooledBuf>> {
        let val = scalar_prefix(key, "scalar")?;
        let time_size = self.time_serde.size();
        let mut buf = write_val(&self.pool, val, Additions::new(1, time_size));
        let value_size = buf.len() - 1 - time_size;

        if value_size <= self.uid_threshold {
            buf[0] = VariableValType::Direct as u8;
            let split = 1 + value_size;
            self.time_serde.write(&mut buf[split..], key.time);
            return Ok(Some(buf));
        }

        let stripped = &buf[1..1 + value_size];
        if value_size <= self.hash_threshold {
            Ok(self
                .uid_db
                .get(txn, stripped)
                .map(|id| self.build_key(VariableValType::UidLookup, &id, key)))
        } else {
            Ok(self
                .hash_db
                .get(txn, stripped)
                .map(|id| self.build_key(VariableValType::HashLookup, &id, key)))
        }
    }

    fn uses_lookup(&self, bytes: &[u8]) -> bool {
        bytes.first() != Some(&(VariableValType::Direct as u8))
    }

    fn used_lookups_recorder(&self) -> Box<dyn UsedLookupsRecorder> {
        Box::new(VariableKeyRecorder {
            uid_db: self.uid_db.clone(),
            hash_db: self.hash_db.clone(),
            time_size: self.time_serde.size(),
        })
    }
}

/// Recorder dispatching on the key's strategy tag
struct VariableKeyRecorder {
    uid_db: UidLookupDb,
    hash_db: HashLookupDb,
    time_size: usize,
}

impl UsedLookupsRecorder for VariableKeyRecorder {
    fn record_used(&self, txn: &mut WriteTxn<'_>, key_bytes: &[u8]) -> Result<()> {
        let Some(&tag_byte) = key_bytes.first() else {
            return Err(StoreError::CorruptKey {
                detail: "empty key".to_string(),
                bytes: String::new(),
            });
        };
        let tag = VariableValType::from_byte(tag_byte, key_bytes)?;
        if key_bytes.len() < 1 + self.time_size {
            return Err(StoreError::CorruptKey {
                detail: "key shorter than tag plus time suffix".to_string(),
                bytes: hex(key_bytes),
            });
        }
        let id = &key_bytes[1..key_bytes.len() - self.time_size];
        match tag {
            VariableValType::Direct => {}
            VariableValType::UidLookup => self.uid_db.record_used(txn, id),
            VariableValType::HashLookup => self.hash_db.record_used(txn, id),
        }
        Ok(())
    }

    fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> Result<usize> {
        Ok(self.uid_db.delete_unused(txn) + self.hash_db.delete_unused(txn))
    }
}
