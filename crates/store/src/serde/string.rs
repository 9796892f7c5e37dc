//! Direct bounded-string key serde
//!
//! The prefix is the raw UTF-8 bytes of the string, never interned, so this
//! is the one serde where a caller-supplied value can organically exceed the
//! store's key-size ceiling. The length check runs before anything is
//! encoded or written: an oversized key is a rejected put, never a truncated
//! one.

use crate::buffer::{ByteBufferPool, PooledBuf};
use crate::env::{ReadOps, WriteTxn};
use crate::error::{Result, StoreError};
use crate::lookup::{NoopUsedLookupsRecorder, UsedLookupsRecorder};
use crate::serde::time::TimeSerde;
use crate::serde::{scalar_prefix, split_time, TemporalKeySerde};
use std::sync::Arc;
use tempokv_core::{KeyPrefix, LimitError, TemporalKey, Val};

/// Direct UTF-8 string key serde bounded by the key ceiling
pub struct LimitedStringKeySerde {
    pool: Arc<ByteBufferPool>,
    time_serde: Arc<dyn TimeSerde>,
    /// Maximum prefix length: key ceiling minus the time suffix
    limit: usize,
}

impl LimitedStringKeySerde {
    /// Create a serde allowing prefixes up to `limit` bytes
    pub fn new(pool: Arc<ByteBufferPool>, time_serde: Arc<dyn TimeSerde>, limit: usize) -> Self {
        LimitedStringKeySerde {
            pool,
            time_serde,
            limit,
        }
    }

    fn encode(&self, key: &TemporalKey) -> Result<PooledBuf> {
        let val = scalar_prefix(key, "String")?;
        let s = val.as_str().ok_or(StoreError::KeyTypeMismatch {
            expected: "String",
            actual: val.type_name(),
        })?;
        let bytes = s.as_bytes();
        if bytes.len() > self.limit {
            return Err(LimitError::KeyTooLong {
                actual: bytes.len(),
                max: self.limit,
            }
            .into());
        }
        let size = self.time_serde.size();
        let mut buf = self.pool.take(bytes.len() + size);
        buf[..bytes.len()].copy_from_slice(bytes);
        self.time_serde.write(&mut buf[bytes.len()..], key.time);
        Ok(buf)
    }
}

impl TemporalKeySerde for LimitedStringKeySerde {
    fn write(&self, _txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf> {
        self.encode(key)
    }

    fn read(&self, _txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey> {
        let (prefix, time) = split_time(bytes, self.time_serde.as_ref())?;
        let s = std::str::from_utf8(prefix)
            .map_err(|e| StoreError::Decode(format!("invalid UTF-8 in string key: {e}")))?;
        Ok(TemporalKey::new(
            KeyPrefix::Value(Val::String(s.to_string())),
            time,
        ))
    }

    fn to_buffer_for_get(
        &self,
        _txn: &dyn ReadOps,
        key: &TemporalKey,
    ) -> Result<Option<PooledBuf>> {
        self.encode(key).map(Some)
    }

    fn uses_lookup(&self, _bytes: &[u8]) -> bool {
        false
    }

    fn used_lookups_recorder(&self) -> Box<dyn UsedLookupsRecorder> {
        Box::new(NoopUsedLookupsRecorder)
    }
}
