//! Temporal state database facade
//!
//! Wires a factory-built key serde, the shared buffer pool and an
//! environment into a usable store: insert keys, probe them back, and run
//! the retention sweep that feeds the used-lookups GC. The value column is
//! the insert instant, so retention can be driven by either the key's own
//! time or the time the row arrived.
//!
//! The configured key schema is persisted into the environment on first use
//! and verified on every subsequent open - reading a store with the wrong
//! schema is an error, not a garbled decode.

use crate::buffer::ByteBufferPool;
use crate::env::{Env, ReadOps};
use crate::error::{Result, StoreError};
use crate::lookup::{HashClashHook, UsedLookupsRecorder};
use crate::schema::{KeySchema, SchemaInfo};
use crate::serde::factory::{create_key_serde, create_time_serde};
use crate::serde::time::TimeSerde;
use crate::serde::TemporalKeySerde;
use byteorder::{BigEndian, ByteOrder};
use std::sync::Arc;
use tempokv_core::{TemporalKey, Timestamp};
use tracing::info;

const DATA_TABLE: &str = "data";
const META_TABLE: &str = "meta";
const SCHEMA_KEY: &[u8] = b"schema";

/// Temporal key-value store over one environment and one key schema
pub struct TemporalDb {
    env: Arc<Env>,
    key_serde: Box<dyn TemporalKeySerde>,
    time_serde: Arc<dyn TimeSerde>,
    recorder: Box<dyn UsedLookupsRecorder>,
}

impl TemporalDb {
    /// Create a store over a fresh environment
    pub fn create(schema: KeySchema) -> Result<Self> {
        Self::open(Env::new(), schema, None)
    }

    /// Open a store over an existing environment
    ///
    /// Persists the schema on first open; afterwards the stored schema must
    /// match `schema` exactly.
    pub fn open(env: Arc<Env>, schema: KeySchema, clash_hook: Option<HashClashHook>) -> Result<Self> {
        let pool = ByteBufferPool::new();
        let key_serde = create_key_serde(&schema, Arc::clone(&pool), clash_hook)?;
        let time_serde = create_time_serde(schema.temporal_precision);
        let recorder = key_serde.used_lookups_recorder();

        let info = SchemaInfo::new(&schema)?;
        env.write(|txn| -> Result<()> {
            let stored = txn.get(META_TABLE, SCHEMA_KEY).map(<[u8]>::to_vec);
            match stored {
                Some(bytes) => {
                    let json = std::str::from_utf8(&bytes)
                        .map_err(|e| StoreError::Schema(e.to_string()))?;
                    SchemaInfo::from_json(json)?.validate_matches(&schema)?;
                }
                None => {
                    txn.put(META_TABLE, SCHEMA_KEY.to_vec(), info.to_json()?.into_bytes());
                }
            }
            Ok(())
        })?;

        Ok(TemporalDb {
            env,
            key_serde,
            time_serde,
            recorder,
        })
    }

    /// The underlying environment
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Insert a key, stamping the current instant as its value
    pub fn insert(&self, key: &TemporalKey) -> Result<()> {
        self.insert_at(key, Timestamp::now())
    }

    /// Insert a key with an explicit insert instant
    pub fn insert_at(&self, key: &TemporalKey, insert_time: Timestamp) -> Result<()> {
        self.env.write(|txn| {
            let key_bytes = self.key_serde.write(txn, key)?;
            let mut value = vec![0u8; 8];
            BigEndian::write_u64(&mut value, insert_time.as_micros());
            txn.put(DATA_TABLE, key_bytes.to_vec(), value);
            Ok(())
        })
    }

    /// Probe for a key; returns its insert instant when present
    ///
    /// A prefix that was never interned short-circuits to `None` without
    /// touching the data table.
    pub fn get(&self, key: &TemporalKey) -> Result<Option<Timestamp>> {
        self.env.read(|txn| {
            let Some(key_bytes) = self.key_serde.to_buffer_for_get(txn, key)? else {
                return Ok(None);
            };
            Ok(txn
                .get(DATA_TABLE, &key_bytes)
                .map(|v| Timestamp::from_micros(BigEndian::read_u64(v))))
        })
    }

    /// Number of stored entries
    pub fn entry_count(&self) -> usize {
        self.env.read(|txn| txn.entry_count(DATA_TABLE))
    }

    /// Decode every stored key, in byte order
    pub fn keys(&self) -> Result<Vec<TemporalKey>> {
        self.env.read(|txn| {
            let mut encoded = Vec::new();
            txn.for_each(DATA_TABLE, &mut |k, _| {
                encoded.push(k.to_vec());
                true
            });
            encoded
                .iter()
                .map(|bytes| self.key_serde.read(txn, bytes))
                .collect()
        })
    }

    /// Delete entries whose key time is before `cutoff`, then reclaim
    /// lookup entries nothing references any more
    ///
    /// Returns the number of data entries deleted. Retained keys are traced
    /// through the serde's recorder first, so the sweep never reclaims a
    /// lookup entry a surviving key still needs - including transitively,
    /// for tag sets.
    pub fn delete_before(&self, cutoff: Timestamp) -> Result<usize> {
        self.env.write(|txn| {
            let size = self.time_serde.size();
            let mut expired: Vec<Vec<u8>> = Vec::new();
            let mut retained: Vec<Vec<u8>> = Vec::new();
            txn.for_each(DATA_TABLE, &mut |k, _| {
                if k.len() >= size {
                    let time = self.time_serde.read(&k[k.len() - size..]);
                    if time.is_before(cutoff) {
                        expired.push(k.to_vec());
                    } else {
                        retained.push(k.to_vec());
                    }
                }
                true
            });

            for key in &expired {
                txn.delete(DATA_TABLE, key);
            }
            for key in &retained {
                self.recorder.record_used(txn, key)?;
            }
            let reclaimed = self.recorder.delete_unused(txn)?;
            info!(
                target: "tempokv::db",
                deleted = expired.len(),
                reclaimed,
                "retention sweep complete"
            );
            Ok(expired.len())
        })
    }
}
