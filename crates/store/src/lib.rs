//! Storage layer for TempoKV
//!
//! This crate implements the temporal key encoding layer and the
//! collaborators it runs against:
//!
//! - `Env` / `ReadTxn` / `WriteTxn`: ordered in-memory tables behind a
//!   single-writer lock
//! - `ByteBufferPool`: RAII-scoped buffer borrowing for every encode path
//! - `UidLookupDb` / `HashLookupDb`: value interning tables with
//!   used-lookup GC bookkeeping
//! - the `TemporalKeySerde` family: fixed-width primitives, bounded
//!   strings, always-interned, adaptive and composite tag keys
//! - `TemporalDb`: a small facade wiring a schema-selected serde into a
//!   usable store with a retention sweep

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod db;
pub mod env;
pub mod error;
pub mod hash;
pub mod lookup;
pub mod schema;
pub mod serde;

pub use buffer::{ByteBufferPool, PooledBuf};
pub use db::TemporalDb;
pub use env::{Env, ReadOps, ReadTxn, WriteTxn};
pub use error::{Result, StoreError};
pub use hash::HashFactory;
pub use lookup::{
    HashClashHook, HashLookupDb, NoopUsedLookupsRecorder, UidLookupDb, UsedLookupsRecorder,
    UID_LEN,
};
pub use schema::{HashLength, KeySchema, KeyType, SchemaInfo, TemporalPrecision};
pub use self::serde::factory::{create_key_serde, create_time_serde, KEY_LOOKUP_DB_NAME};
pub use self::serde::time::TimeSerde;
pub use self::serde::variable::VariableValType;
pub use self::serde::TemporalKeySerde;
