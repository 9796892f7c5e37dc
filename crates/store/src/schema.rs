//! Key schema configuration
//!
//! A store instance is opened against one `KeySchema`: the key type, the
//! temporal precision of the trailing time suffix, the hash width for
//! hash-interned keys and the size limits. The schema is serialized to JSON
//! and persisted as `SchemaInfo`; reopening (or merging from) a store with a
//! different schema is rejected rather than silently misread.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use tempokv_core::Limits;

/// Configured key type, selecting the serde for the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// 1-byte boolean prefix
    Boolean,
    /// 1-byte integer prefix
    Byte,
    /// 2-byte integer prefix
    Short,
    /// 4-byte integer prefix
    Int,
    /// 8-byte integer prefix
    Long,
    /// 4-byte float prefix
    Float,
    /// 8-byte float prefix
    Double,
    /// Direct UTF-8 string prefix, bounded by the key ceiling
    String,
    /// Prefix always interned through the uid lookup table
    UidLookup,
    /// Prefix always interned through the hash lookup table
    HashLookup,
    /// Per-value adaptive encoding (direct / uid / hash)
    Variable,
    /// Composite sorted tag-list prefix
    Tags,
}

/// Precision of the fixed-width time suffix on every key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalPrecision {
    /// 8-byte nanosecond suffix
    Nanosecond,
    /// 8-byte millisecond suffix
    Millisecond,
    /// 4-byte second suffix
    Second,
    /// 4-byte minute suffix
    Minute,
    /// 4-byte hour suffix
    Hour,
    /// 4-byte day suffix
    Day,
}

/// Width of content hashes used by the hash lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashLength {
    /// 4-byte hash
    Integer,
    /// 8-byte hash
    Long,
}

/// Complete key schema for one store instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySchema {
    /// Key type, selecting the serde
    pub key_type: KeyType,
    /// Precision of the time suffix
    pub temporal_precision: TemporalPrecision,
    /// Hash width for hash-interned keys
    pub hash_length: HashLength,
    /// Size limits the encoding layer enforces
    #[serde(default)]
    pub limits: Limits,
}

impl KeySchema {
    /// Create a schema with default precision, hash length and limits
    pub fn new(key_type: KeyType) -> Self {
        KeySchema {
            key_type,
            temporal_precision: TemporalPrecision::Millisecond,
            hash_length: HashLength::Long,
            limits: Limits::default(),
        }
    }

    /// Set the temporal precision
    pub fn with_precision(mut self, precision: TemporalPrecision) -> Self {
        self.temporal_precision = precision;
        self
    }

    /// Set the hash width
    pub fn with_hash_length(mut self, hash_length: HashLength) -> Self {
        self.hash_length = hash_length;
        self
    }

    /// Set the size limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// Current schema metadata version
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Persisted schema metadata
///
/// Stored alongside the data so a reopened store can verify it is being read
/// with the schema it was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Metadata format version
    pub version: u32,
    /// JSON rendering of the key schema
    pub key_schema: String,
}

impl SchemaInfo {
    /// Build schema metadata for a key schema
    pub fn new(schema: &KeySchema) -> Result<Self> {
        let key_schema =
            serde_json::to_string(schema).map_err(|e| StoreError::Schema(e.to_string()))?;
        Ok(SchemaInfo {
            version: CURRENT_SCHEMA_VERSION,
            key_schema,
        })
    }

    /// Serialize the metadata itself
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| StoreError::Schema(e.to_string()))
    }

    /// Parse persisted metadata
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Schema(e.to_string()))
    }

    /// Check that persisted metadata matches the configured schema
    pub fn validate_matches(&self, schema: &KeySchema) -> Result<()> {
        let expected = SchemaInfo::new(schema)?;
        if *self != expected {
            return Err(StoreError::SchemaMismatch {
                expected: expected.key_schema,
                actual: self.key_schema.clone(),
            });
        }
        Ok(())
    }
}
