//! Serde construction dispatch
//!
//! Pure 1:1 mapping from configured key type to serde implementation,
//! building the lookup-table handles a serde needs against the shared
//! `"key"` lookup namespace. No runtime state of its own.

use crate::buffer::ByteBufferPool;
use crate::error::Result;
use crate::hash::HashFactory;
use crate::lookup::{HashClashHook, HashLookupDb, UidLookupDb};
use crate::schema::{KeySchema, KeyType, TemporalPrecision};
use crate::serde::lookup_key::{HashLookupKeySerde, UidLookupKeySerde};
use crate::serde::simple::{
    BooleanKeySerde, ByteKeySerde, DoubleKeySerde, FloatKeySerde, IntKeySerde, LongKeySerde,
    ShortKeySerde,
};
use crate::serde::string::LimitedStringKeySerde;
use crate::serde::tags::TagsKeySerde;
use crate::serde::time::{
    DayTimeSerde, HourTimeSerde, MillisecondTimeSerde, MinuteTimeSerde, NanosecondTimeSerde,
    SecondTimeSerde, TimeSerde,
};
use crate::serde::variable::VariableKeySerde;
use crate::serde::TemporalKeySerde;
use std::sync::Arc;

/// Lookup namespace shared by every key serde of a store instance
pub const KEY_LOOKUP_DB_NAME: &str = "key";

/// Build the time serde for a configured precision
pub fn create_time_serde(precision: TemporalPrecision) -> Arc<dyn TimeSerde> {
    match precision {
        TemporalPrecision::Nanosecond => Arc::new(NanosecondTimeSerde),
        TemporalPrecision::Millisecond => Arc::new(MillisecondTimeSerde),
        TemporalPrecision::Second => Arc::new(SecondTimeSerde),
        TemporalPrecision::Minute => Arc::new(MinuteTimeSerde),
        TemporalPrecision::Hour => Arc::new(HourTimeSerde),
        TemporalPrecision::Day => Arc::new(DayTimeSerde),
    }
}

/// Build the key serde for a schema
///
/// Validates the schema's limits against the configured time width first;
/// an inconsistent configuration is rejected before any key is written.
pub fn create_key_serde(
    schema: &KeySchema,
    pool: Arc<ByteBufferPool>,
    clash_hook: Option<HashClashHook>,
) -> Result<Box<dyn TemporalKeySerde>> {
    let time_serde = create_time_serde(schema.temporal_precision);
    schema.limits.validate(time_serde.size())?;

    let serde: Box<dyn TemporalKeySerde> = match schema.key_type {
        KeyType::Boolean => Box::new(BooleanKeySerde::new(pool, time_serde)),
        KeyType::Byte => Box::new(ByteKeySerde::new(pool, time_serde)),
        KeyType::Short => Box::new(ShortKeySerde::new(pool, time_serde)),
        KeyType::Int => Box::new(IntKeySerde::new(pool, time_serde)),
        KeyType::Long => Box::new(LongKeySerde::new(pool, time_serde)),
        KeyType::Float => Box::new(FloatKeySerde::new(pool, time_serde)),
        KeyType::Double => Box::new(DoubleKeySerde::new(pool, time_serde)),
        KeyType::String => {
            let limit = schema.limits.max_key_bytes - time_serde.size();
            Box::new(LimitedStringKeySerde::new(pool, time_serde, limit))
        }
        KeyType::UidLookup => {
            let uid_db = UidLookupDb::new(KEY_LOOKUP_DB_NAME);
            Box::new(UidLookupKeySerde::new(uid_db, pool, time_serde))
        }
        KeyType::HashLookup => {
            let hash_db = HashLookupDb::new(
                KEY_LOOKUP_DB_NAME,
                HashFactory::new(schema.hash_length),
                clash_hook,
            );
            Box::new(HashLookupKeySerde::new(hash_db, pool, time_serde))
        }
        KeyType::Variable => {
            let uid_db = UidLookupDb::new(KEY_LOOKUP_DB_NAME);
            let hash_db = HashLookupDb::new(
                KEY_LOOKUP_DB_NAME,
                HashFactory::new(schema.hash_length),
                clash_hook,
            );
            Box::new(VariableKeySerde::new(
                uid_db,
                hash_db,
                pool,
                time_serde,
                &schema.limits,
            ))
        }
        KeyType::Tags => {
            let uid_db = UidLookupDb::new(KEY_LOOKUP_DB_NAME);
            Box::new(TagsKeySerde::new(uid_db, pool, time_serde))
        }
    };
    Ok(serde)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;
    use crate::error::StoreError;
    use tempokv_core::{KeyPrefix, Limits, Tag, TemporalKey, Timestamp, Val};

    fn roundtrip_through(schema: KeySchema, key: TemporalKey) {
        let serde = create_key_serde(&schema, ByteBufferPool::new(), None).unwrap();
        let env = Env::new();
        let bytes = env
            .write(|txn| serde.write(txn, &key).map(|b| b.to_vec()))
            .unwrap();
        let decoded = env.read(|txn| serde.read(txn, &bytes)).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_every_key_type_constructs_and_roundtrips() {
        let t = Timestamp::from_millis(1_000);
        let cases: Vec<(KeyType, TemporalKey)> = vec![
            (KeyType::Boolean, TemporalKey::new(KeyPrefix::Value(Val::Bool(true)), t)),
            (KeyType::Byte, TemporalKey::new(KeyPrefix::Value(Val::Byte(-1)), t)),
            (KeyType::Short, TemporalKey::new(KeyPrefix::Value(Val::Short(2)), t)),
            (KeyType::Int, TemporalKey::new(KeyPrefix::Value(Val::Int(3)), t)),
            (KeyType::Long, TemporalKey::new(KeyPrefix::Value(Val::Long(4)), t)),
            (KeyType::Float, TemporalKey::new(KeyPrefix::Value(Val::Float(0.5)), t)),
            (KeyType::Double, TemporalKey::new(KeyPrefix::Value(Val::Double(0.25)), t)),
            (KeyType::String, TemporalKey::of("str", t)),
            (KeyType::UidLookup, TemporalKey::of("uid", t)),
            (KeyType::HashLookup, TemporalKey::of("hash", t)),
            (KeyType::Variable, TemporalKey::of("var", t)),
            (
                KeyType::Tags,
                TemporalKey::new(KeyPrefix::tags(vec![Tag::new("a", "b")]), t),
            ),
        ];
        for (key_type, key) in cases {
            roundtrip_through(KeySchema::new(key_type), key);
        }
    }

    #[test]
    fn test_time_serde_sizes() {
        assert_eq!(create_time_serde(TemporalPrecision::Nanosecond).size(), 8);
        assert_eq!(create_time_serde(TemporalPrecision::Millisecond).size(), 8);
        assert_eq!(create_time_serde(TemporalPrecision::Second).size(), 4);
        assert_eq!(create_time_serde(TemporalPrecision::Minute).size(), 4);
        assert_eq!(create_time_serde(TemporalPrecision::Hour).size(), 4);
        assert_eq!(create_time_serde(TemporalPrecision::Day).size(), 4);
    }

    #[test]
    fn test_inconsistent_limits_rejected_at_construction() {
        let schema = KeySchema::new(KeyType::Variable).with_limits(Limits {
            max_key_bytes: 16,
            uid_inline_bytes: 32,
        });
        let result = create_key_serde(&schema, ByteBufferPool::new(), None);
        assert!(matches!(result, Err(StoreError::Limit(_))));
    }

    #[test]
    fn test_string_serde_limit_reflects_time_width() {
        // Second precision leaves a larger string budget than millisecond.
        let schema = KeySchema::new(KeyType::String)
            .with_precision(TemporalPrecision::Second);
        let serde = create_key_serde(&schema, ByteBufferPool::new(), None).unwrap();
        let env = Env::new();
        let at_limit = TemporalKey::of("x".repeat(511 - 4).as_str(), Timestamp::EPOCH);
        assert!(env.write(|txn| serde.write(txn, &at_limit).map(|_| ())).is_ok());
        let over = TemporalKey::of("x".repeat(511 - 4 + 1).as_str(), Timestamp::EPOCH);
        assert!(env.write(|txn| serde.write(txn, &over).map(|_| ())).is_err());
    }
}
