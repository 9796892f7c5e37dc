//! TempoKV - embedded temporal key-value store with interned key
//! serialization
//!
//! TempoKV keys every entry on a typed prefix plus an instant, encoded as an
//! ordered byte string `[prefix][time]` whose trailing time slice is fixed
//! width - so time-range scans inside a prefix are pure byte comparisons.
//! Prefixes can be stored inline, interned through uid or content-hash
//! lookup tables, chosen adaptively per value, or composed from sorted tag
//! sets.
//!
//! # Quick Start
//!
//! ```
//! use tempokv::{KeySchema, KeyType, TemporalDb, TemporalKey, Timestamp};
//!
//! let db = TemporalDb::create(KeySchema::new(KeyType::String))?;
//!
//! let key = TemporalKey::of("sensor-7", Timestamp::from_secs(1_700_000_000));
//! db.insert(&key)?;
//!
//! assert!(db.get(&key)?.is_some());
//! # Ok::<(), tempokv::StoreError>(())
//! ```
//!
//! # Architecture
//!
//! Domain types (`Val`, `Timestamp`, `TemporalKey`, `Limits`) live in
//! `tempokv-core`; the encoding layer, lookup tables and store facade live
//! in `tempokv-store`. This crate re-exports the public API of both.

pub use tempokv_core::{KeyPrefix, LimitError, Limits, Tag, TemporalKey, Timestamp, Val};
pub use tempokv_store::{
    create_key_serde, create_time_serde, ByteBufferPool, Env, HashFactory, HashLength,
    HashLookupDb, KeySchema, KeyType, ReadOps, Result, SchemaInfo, StoreError, TemporalDb,
    TemporalKeySerde, TemporalPrecision, TimeSerde, UidLookupDb, UsedLookupsRecorder,
    VariableValType, KEY_LOOKUP_DB_NAME, UID_LEN,
};
