//! Fixed-width primitive key serdes
//!
//! One serde per primitive key type, all sharing a single template
//! parameterized by a [`FixedPrefix`]: the prefix is the primitive's natural
//! big-endian byte width, the time suffix follows, and that is the whole
//! key. Nothing here touches a lookup table.

use crate::buffer::{ByteBufferPool, PooledBuf};
use crate::env::{ReadOps, WriteTxn};
use crate::error::{hex, Result, StoreError};
use crate::lookup::{NoopUsedLookupsRecorder, UsedLookupsRecorder};
use crate::serde::time::TimeSerde;
use crate::serde::{scalar_prefix, split_time, TemporalKeySerde};
use byteorder::{BigEndian, ByteOrder};
use std::marker::PhantomData;
use std::sync::Arc;
use tempokv_core::{KeyPrefix, TemporalKey, Val};

/// Fixed-width prefix codec for one primitive type
pub trait FixedPrefix: Send + Sync + 'static {
    /// Prefix width in bytes
    const WIDTH: usize;

    /// Name used in type-mismatch diagnostics
    const TYPE_NAME: &'static str;

    /// Encode `val` into `buf` (`buf.len() == WIDTH`)
    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()>;

    /// Decode `buf` (`buf.len() == WIDTH`)
    fn read_prefix(buf: &[u8]) -> Val;
}

fn mismatch(expected: &'static str, val: &Val) -> StoreError {
    StoreError::KeyTypeMismatch {
        expected,
        actual: val.type_name(),
    }
}

/// Boolean prefix: one byte, 0 or 1
#[derive(Debug)]
pub struct BooleanPrefix;

impl FixedPrefix for BooleanPrefix {
    const WIDTH: usize = 1;
    const TYPE_NAME: &'static str = "Bool";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let b = val.as_bool().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        buf[0] = u8::from(b);
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Bool(buf[0] != 0)
    }
}

/// Byte prefix: one byte
#[derive(Debug)]
pub struct BytePrefix;

impl FixedPrefix for BytePrefix {
    const WIDTH: usize = 1;
    const TYPE_NAME: &'static str = "Byte";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let b = val.as_byte().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        buf[0] = b as u8;
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Byte(buf[0] as i8)
    }
}

/// Short prefix: two bytes big-endian
#[derive(Debug)]
pub struct ShortPrefix;

impl FixedPrefix for ShortPrefix {
    const WIDTH: usize = 2;
    const TYPE_NAME: &'static str = "Short";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let s = val.as_short().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        BigEndian::write_i16(buf, s);
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Short(BigEndian::read_i16(buf))
    }
}

/// Int prefix: four bytes big-endian
#[derive(Debug)]
pub struct IntPrefix;

impl FixedPrefix for IntPrefix {
    const WIDTH: usize = 4;
    const TYPE_NAME: &'static str = "Int";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let i = val.as_int().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        BigEndian::write_i32(buf, i);
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Int(BigEndian::read_i32(buf))
    }
}

/// Long prefix: eight bytes big-endian
#[derive(Debug)]
pub struct LongPrefix;

impl FixedPrefix for LongPrefix {
    const WIDTH: usize = 8;
    const TYPE_NAME: &'static str = "Long";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let l = val.as_long().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        BigEndian::write_i64(buf, l);
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Long(BigEndian::read_i64(buf))
    }
}

/// Float prefix: four bytes, IEEE-754 bits big-endian
#[derive(Debug)]
pub struct FloatPrefix;

impl FixedPrefix for FloatPrefix {
    const WIDTH: usize = 4;
    const TYPE_NAME: &'static str = "Float";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let f = val.as_float().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        BigEndian::write_u32(buf, f.to_bits());
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Float(f32::from_bits(BigEndian::read_u32(buf)))
    }
}

/// Double prefix: eight bytes, IEEE-754 bits big-endian
#[derive(Debug)]
pub struct DoublePrefix;

impl FixedPrefix for DoublePrefix {
    const WIDTH: usize = 8;
    const TYPE_NAME: &'static str = "Double";

    fn write_prefix(val: &Val, buf: &mut [u8]) -> Result<()> {
        let d = val.as_double().ok_or_else(|| mismatch(Self::TYPE_NAME, val))?;
        BigEndian::write_u64(buf, d.to_bits());
        Ok(())
    }

    fn read_prefix(buf: &[u8]) -> Val {
        Val::Double(f64::from_bits(BigEndian::read_u64(buf)))
    }
}

/// Shared template for fixed-width primitive keys
///
/// Write and get produce identical bytes; neither consults the transaction
/// beyond holding it, so a get can never miss.
pub struct SimpleKeySerde<P: FixedPrefix> {
    pool: Arc<ByteBufferPool>,
    time_serde: Arc<dyn TimeSerde>,
    _prefix: PhantomData<P>,
}

impl<P: FixedPrefix> SimpleKeySerde<P> {
    /// Create a serde over the shared pool and time suffix
    pub fn new(pool: Arc<ByteBufferPool>, time_serde: Arc<dyn TimeSerde>) -> Self {
        SimpleKeySerde {
            pool,
            time_serde,
            _prefix: PhantomData,
        }
    }

    fn encode(&self, key: &TemporalKey) -> Result<PooledBuf> {
        let val = scalar_prefix(key, P::TYPE_NAME)?;
        let size = self.time_serde.size();
        let mut buf = self.pool.take(P::WIDTH + size);
        P::write_prefix(val, &mut buf[..P::WIDTH])?;
        self.time_serde.write(&mut buf[P::WIDTH..], key.time);
        Ok(buf)
    }
}

impl<P: FixedPrefix> TemporalKeySerde for SimpleKeySerde<P> {
    fn write(&self, _txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf> {
        self.encode(key)
    }

    fn read(&self, _txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey> {
        let expected = P::WIDTH + self.time_serde.size();
        if bytes.len() != expected {
            return Err(StoreError::CorruptKey {
                detail: format!("{} key is {} bytes, expected {expected}", P::TYPE_NAME, bytes.len()),
                bytes: hex(bytes),
            });
        }
        let (prefix, time) = split_time(bytes, self.time_serde.as_ref())?;
        Ok(TemporalKey::new(
            KeyPrefix::Value(P::read_prefix(prefix)),
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

/// Boolean key serde
pub type BooleanKeySerde = SimpleKeySerde<BooleanPrefix>;
/// Byte key serde
pub type ByteKeySerde = SimpleKeySerde<BytePrefix>;
/// Short key serde
pub type ShortKeySerde = SimpleKeySerde<ShortPrefix>;
/// Int key serde
pub type IntKeySerde = SimpleKeySerde<IntPrefix>;
/// Long key serde
pub type LongKeySerde = SimpleKeySerde<LongPrefix>;
/// Float key serde
pub type FloatKeySerde = SimpleKeySerde<FloatPrefix>;
/// Double key serde
pub type DoubleKeySerde = SimpleKeySerde<DoublePrefix>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;
    use crate::serde::time::MillisecondTimeSerde;
    use tempokv_core::Timestamp;

    fn long_serde() -> LongKeySerde {
        SimpleKeySerde::new(ByteBufferPool::new(), Arc::new(MillisecondTimeSerde))
    }

    fn write_read(serde: &dyn TemporalKeySerde, key: &TemporalKey) -> TemporalKey {
        let env = Env::new();
        let bytes = env.write(|txn| serde.write(txn, key).map(|b| b.to_vec())).unwrap();
        env.read(|txn| serde.read(txn, &bytes)).unwrap()
    }

    #[test]
    fn test_long_roundtrip() {
        let serde = long_serde();
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            let key = TemporalKey::of(value, Timestamp::from_millis(1_000));
            assert_eq!(write_read(&serde, &key), key);
        }
    }

    #[test]
    fn test_all_primitive_roundtrips() {
        let pool = ByteBufferPool::new();
        let time: Arc<dyn TimeSerde> = Arc::new(MillisecondTimeSerde);
        let t = Timestamp::from_millis(42);

        let cases: Vec<(Box<dyn TemporalKeySerde>, Val)> = vec![
            (
                Box::new(BooleanKeySerde::new(pool.clone(), time.clone())),
                Val::Bool(true),
            ),
            (
                Box::new(ByteKeySerde::new(pool.clone(), time.clone())),
                Val::Byte(-7),
            ),
            (
                Box::new(ShortKeySerde::new(pool.clone(), time.clone())),
                Val::Short(i16::MAX),
            ),
            (
                Box::new(IntKeySerde::new(pool.clone(), time.clone())),
                Val::Int(i32::MIN),
            ),
            (
                Box::new(LongKeySerde::new(pool.clone(), time.clone())),
                Val::Long(123_456_789),
            ),
            (
                Box::new(FloatKeySerde::new(pool.clone(), time.clone())),
                Val::Float(f32::NAN),
            ),
            (
                Box::new(DoubleKeySerde::new(pool.clone(), time.clone())),
                Val::Double(f64::NEG_INFINITY),
            ),
        ];

        for (serde, val) in cases {
            let key = TemporalKey::new(KeyPrefix::Value(val), t);
            assert_eq!(write_read(serde.as_ref(), &key), key);
        }
    }

    #[test]
    fn test_prefix_width_is_fixed() {
        let serde = long_serde();
        let env = Env::new();
        let key = TemporalKey::of(5i64, Timestamp::from_millis(9));
        let bytes = env.write(|txn| serde.write(txn, &key).map(|b| b.to_vec())).unwrap();
        assert_eq!(bytes.len(), 8 + 8);
    }

    #[test]
    fn test_wrong_val_variant_rejected() {
        let serde = long_serde();
        let env = Env::new();
        let key = TemporalKey::of("not a long", Timestamp::EPOCH);
        let result = env.write(|txn| serde.write(txn, &key).map(|_| ()));
        assert!(matches!(
            result,
            Err(StoreError::KeyTypeMismatch { expected: "Long", actual: "String" })
        ));
    }

    #[test]
    fn test_wrong_length_read_rejected() {
        let serde = long_serde();
        let env = Env::new();
        let result = env.read(|txn| serde.read(txn, &[0u8; 3]));
        assert!(matches!(result, Err(StoreError::CorruptKey { .. })));
    }

    #[test]
    fn test_get_buffer_matches_write_buffer() {
        let serde = long_serde();
        let env = Env::new();
        let key = TemporalKey::of(77i64, Timestamp::from_millis(1_234));
        let written = env.write(|txn| serde.write(txn, &key).map(|b| b.to_vec())).unwrap();
        let probe = env
            .read(|txn| serde.to_buffer_for_get(txn, &key).map(|b| b.unwrap().to_vec()))
            .unwrap();
        assert_eq!(written, probe);
    }

    #[test]
    fn test_uses_no_lookup() {
        let serde = long_serde();
        assert!(!serde.uses_lookup(&[0u8; 16]));
    }
}
