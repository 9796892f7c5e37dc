//! Temporal key serdes
//!
//! Every serde converts between the logical [`TemporalKey`] and its ordered
//! byte-string form `[prefix-encoding][time-encoding]`. The trailing time
//! slice is fixed-width for a store instance, so time-range scans within a
//! prefix are byte-slicing; the prefix encoding varies by serde:
//!
//! - fixed-width primitives ([`simple`])
//! - direct bounded strings ([`string`])
//! - always-interned prefixes ([`lookup_key`])
//! - per-value adaptive encoding ([`variable`])
//! - composite sorted tag lists ([`tags`])
//!
//! Construction is dispatched by [`factory`] from the configured key type.

pub mod factory;
pub mod lookup_key;
pub mod simple;
pub mod string;
pub mod tags;
pub mod time;
pub mod val;
pub mod variable;

use crate::buffer::PooledBuf;
use crate::env::{ReadOps, WriteTxn};
use crate::error::{hex, Result, StoreError};
use crate::lookup::UsedLookupsRecorder;
use crate::serde::time::TimeSerde;
use tempokv_core::{Timestamp, TemporalKey, Val};

/// Converts between [`TemporalKey`] and its encoded byte-string form
///
/// Write-side methods run inside the single write transaction and may intern
/// values into lookup tables. `read` accepts any transaction. A lookup entry
/// missing during `to_buffer_for_get` yields `Ok(None)` (the prefix was
/// simply never written); the same miss during `read` is a decode error,
/// because `read` is only handed keys that exist in the primary table.
pub trait TemporalKeySerde: Send + Sync {
    /// Encode `key` for a write, interning through lookups where configured
    fn write(&self, txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf>;

    /// Decode a stored key
    fn read(&self, txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey>;

    /// Encode `key` for a point read without mutating any lookup table
    ///
    /// `None` means some referenced value was never interned, so no stored
    /// key can match.
    fn to_buffer_for_get(
        &self,
        txn: &dyn ReadOps,
        key: &TemporalKey,
    ) -> Result<Option<PooledBuf>>;

    /// Whether the given encoded key references a lookup table
    fn uses_lookup(&self, bytes: &[u8]) -> bool;

    /// Recorder tracing every lookup id this serde's keys reference
    fn used_lookups_recorder(&self) -> Box<dyn UsedLookupsRecorder>;
}

/// Split an encoded key into prefix bytes and decoded time suffix.
pub(crate) fn split_time<'a>(
    bytes: &'a [u8],
    time_serde: &dyn TimeSerde,
) -> Result<(&'a [u8], Timestamp)> {
    let size = time_serde.size();
    if bytes.len() < size {
        return Err(StoreError::CorruptKey {
            detail: format!("key shorter than its {size}-byte time suffix"),
            bytes: hex(bytes),
        });
    }
    let split = bytes.len() - size;
    let time = time_serde.read(&bytes[split..]);
    Ok((&bytes[..split], time))
}

/// Extract the scalar prefix value, rejecting tag-list prefixes.
pub(crate) fn scalar_prefix<'a>(key: &'a TemporalKey, expected: &'static str) -> Result<&'a Val> {
    key.prefix
        .as_val()
        .ok_or(StoreError::KeyTypeMismatch {
            expected,
            actual: "Tags",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serde::time::MillisecondTimeSerde;
    use tempokv_core::KeyPrefix;

    #[test]
    fn test_split_time() {
        let serde = MillisecondTimeSerde;
        let mut bytes = vec![0xaa, 0xbb];
        let mut suffix = vec![0u8; serde.size()];
        serde.write(&mut suffix, Timestamp::from_millis(1234));
        bytes.extend_from_slice(&suffix);

        let (prefix, time) = split_time(&bytes, &serde).unwrap();
        assert_eq!(prefix, &[0xaa, 0xbb]);
        assert_eq!(time, Timestamp::from_millis(1234));
    }

    #[test]
    fn test_split_time_too_short() {
        let serde = MillisecondTimeSerde;
        let result = split_time(&[1, 2, 3], &serde);
        assert!(matches!(result, Err(StoreError::CorruptKey { .. })));
    }

    #[test]
    fn test_scalar_prefix_rejects_tags() {
        let key = TemporalKey::new(KeyPrefix::tags(Vec::new()), Timestamp::EPOCH);
        let result = scalar_prefix(&key, "Long");
        assert!(matches!(
            result,
            Err(StoreError::KeyTypeMismatch { expected: "Long", actual: "Tags" })
        ));
    }
}
