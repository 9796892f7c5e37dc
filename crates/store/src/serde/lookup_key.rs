//! Always-interned key serdes
//!
//! Both serdes here store the prefix indirectly: the value codec's bytes go
//! into a lookup table and the key carries only the table's id ahead of the
//! time suffix. The uid variant keys on a fixed 8-byte sequence id, the hash
//! variant on a content hash whose width (and clash-chain extension) the
//! hash table owns.

use crate::buffer::{ByteBufferPool, PooledBuf};
use crate::env::{ReadOps, WriteTxn};
use crate::error::{hex, Result, StoreError};
use crate::lookup::{HashLookupDb, UidLookupDb, UsedLookupsRecorder};
use crate::serde::time::TimeSerde;
use crate::serde::val::{read_val, write_val, Additions};
use crate::serde::{scalar_prefix, split_time, TemporalKeySerde};
use std::sync::Arc;
use tempokv_core::{KeyPrefix, TemporalKey};

/// Key serde interning every prefix through the uid lookup table
pub struct UidLookupKeySerde {
    uid_db: UidLookupDb,
    pool: Arc<ByteBufferPool>,
    time_serde: Arc<dyn TimeSerde>,
}

impl UidLookupKeySerde {
    /// Create a serde over the given uid table
    pub fn new(uid_db: UidLookupDb, pool: Arc<ByteBufferPool>, time_serde: Arc<dyn TimeSerde>) -> Self {
        UidLookupKeySerde {
            uid_db,
            pool,
            time_serde,
        }
    }

    fn build_key(&self, id: &[u8], key: &TemporalKey) -> PooledBuf {
        let size = self.time_serde.size();
        let mut buf = self.pool.take(id.len() + size);
        buf[..id.len()].copy_from_slice(id);
        self.time_serde.write(&mut buf[id.len()..], key.time);
        buf
    }
}

impl TemporalKeySerde for UidLookupKeySerde {
    fn write(&self, txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf> {
        let val = scalar_prefix(key, "scalar")?;
        let value_bytes = write_val(&self.pool, val, Additions::NONE);
        let id = self.uid_db.put(txn, &value_bytes);
        Ok(self.build_key(&id, key))
    }

    fn read(&self, txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey> {
        let (id, time) = split_time(bytes, self.time_serde.as_ref())?;
        let value_bytes = self.uid_db.get_value(txn, id).ok_or(StoreError::LookupMiss {
            id: hex(id),
        })?;
        let val = read_val(value_bytes)?;
        Ok(TemporalKey::new(KeyPrefix::Value(val), time))
    }

    fn to_buffer_for_get(
        &self,
        txn: &dyn ReadOps,
        key: &TemporalKey,
    ) -> Result<Option<PooledBuf>> {
        let val = scalar_prefix(key, "scalar")?;
        let value_bytes = write_val(&self.pool, val, Additions::NONE);
        Ok(self
            .uid_db
            .get(txn, &value_bytes)
            .map(|id| self.build_key(&id, key)))
    }

    fn uses_lookup(&self, _bytes: &[u8]) -> bool {
        true
    }

    fn used_lookups_recorder(&self) -> Box<dyn UsedLookupsRecorder> {
        Box::new(UidKeyRecorder {
            uid_db: self.uid_db.clone(),
            time_size: self.time_serde.size(),
        })
    }
}

/// Recorder for uid-interned keys: the id is everything before the suffix
struct UidKeyRecorder {
    uid_db: UidLookupDb,
    time_size: usize,
}

impl UsedLookupsRecorder for UidKeyRecorder {
    fn record_used(&self, txn: &mut WriteTxn<'_>, key_bytes: &[u8]) -> Result<()> {
        if key_bytes.len() < self.time_size {
            return Err(StoreError::CorruptKey {
                detail: "key shorter than its time suffix".to_string(),
                bytes: hex(key_bytes),
            });
        }
        let id = &key_bytes[..key_bytes.len() - self.time_size];
        self.uid_db.record_used(txn, id);
        Ok(())
    }

    fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> Result<usize> {
        Ok(self.uid_db.delete_unused(txn))
    }
}

/// Key serde interning every prefix through the hash lookup table
pub struct HashLookupKeySerde {
    hash_db: HashLookupDb,
    pool: Arc<ByteBufferPool>,
    time_serde: Arc<dyn TimeSerde>,
}

impl HashLookupKeySerde {
    /// Create a serde over the given hash table
    pub fn new(
        hash_db: HashLookupDb,
        pool: Arc<ByteBufferPool>,
        time_serde: Arc<dyn TimeSerde>,
    ) -> Self {
        HashLookupKeySerde {
            hash_db,
            pool,
            time_serde,
        }
    }

    fn build_key(&self, id: &[u8], key: &TemporalKey) -> PooledBuf {
        let size = self.time_serde.size();
        let mut buf = self.pool.take(id.len() + size);
        buf[..id.len()].copy_from_slice(id);
        self.time_serde.write(&mut buf[id.len()..], key.time);
        buf
    }
}

impl TemporalKeySerde for HashLookupKeySerde {
    fn write(&self, txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf> {
        let val = scalar_prefix(key, "scalar")?;
        let value_bytes = write_val(&self.pool, val, Additions::NONE);
        let id = self.hash_db.put(txn, &value_bytes);
        Ok(self.build_key(&id, key))
    }

    fn read(&self, txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey> {
        let (id, time) = split_time(bytes, self.time_serde.as_ref())?;
        let value_bytes = self
            .hash_db
            .get_value(txn, id)
            .ok_or(StoreError::LookupMiss { id: hex(id) })?;
        let val = read_val(value_bytes)?;
        Ok(TemporalKey::new(KeyPrefix::Value(val), time))
    }

    fn to_buffer_for_get(
        &self,
        txn: &dyn ReadOps,
        key: &TemporalKey,
    ) -> Result<Option<PooledBuf>> {
        let val = scalar_prefix(key, "scalar")?;
        let value_bytes = write_val(&self.pool, val, Additions::NONE);
        Ok(self
            .hash_db
            .get(txn, &value_bytes)
            .map(|id| self.build_key(&id, key)))
    }

    fn uses_lookup(&self, _bytes: &[u8]) -> bool {
        true
    }

    fn used_lookups_recorder(&self) -> Box<dyn UsedLookupsRecorder> {
        Box::new(HashKeyRecorder {
            hash_db: self.hash_db.clone(),
            time_size: self.time_serde.size(),
        })
    }
}

/// Recorder for hash-interned keys
struct HashKeyRecorder {
    hash_db: HashLookupDb,
    time_size: usize,
}

impl UsedLookupsRecorder for HashKeyRecorder {
    fn record_used(&self, txn: &mut WriteTxn<'_>, key_bytes: &[u8]) -> Result<()> {
        if key_bytes.len() < self.time_size {
            return Err(StoreError::CorruptKey {
                detail: "key shorter than its time suffix".to_string(),
                bytes: hex(key_bytes),
            });
        }
        let id = &key_bytes[..key_bytes.len() - self.time_size];
        self.hash_db.record_used(txn, id);
        Ok(())
    }

    fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> Result<usize> {
        Ok(self.hash_db.delete_unused(txn))
    }
}
