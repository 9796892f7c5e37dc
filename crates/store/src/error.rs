//! Error types for the store layer
//!
//! Recoverable conditions (a lookup entry missing during a get) never appear
//! here - those are absorbed into `Option` returns at the serde boundary.
//! Everything below propagates to the caller, carrying as much diagnostic
//! context as the failure site has (for corrupt keys, the full byte dump).

use tempokv_core::LimitError;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// A configured or encoded size limit was violated
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// The caller handed a serde a `Val` variant it is not configured for
    #[error("Key type mismatch: serde expects {expected}, got {actual}")]
    KeyTypeMismatch {
        /// Key type the serde was built for
        expected: &'static str,
        /// Variant actually supplied
        actual: &'static str,
    },

    /// A value payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A stored key failed a structural consistency check
    ///
    /// Carries the full hex dump of the offending key: the variant tag makes
    /// corrupted data hard to diagnose without the raw bytes.
    #[error("Corrupt key ({detail}): [{bytes}]")]
    CorruptKey {
        /// What the check found
        detail: String,
        /// Hex dump of the complete key
        bytes: String,
    },

    /// A lookup id referenced by a stored key has no entry in its table
    #[error("Lookup entry missing for id [{id}]")]
    LookupMiss {
        /// Hex dump of the dangling id
        id: String,
    },

    /// Stored schema does not match the schema the store was opened with
    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch {
        /// Schema the caller configured
        expected: String,
        /// Schema found in the store
        actual: String,
    },

    /// Schema metadata could not be serialized or parsed
    #[error("Schema error: {0}")]
    Schema(String),
}

/// Render bytes as a space-separated hex dump for diagnostics.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
