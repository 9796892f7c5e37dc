//! Size limits for encoded keys
//!
//! The encoding layer enforces two configurable ceilings: the maximum encoded
//! key length the underlying ordered store accepts, and the inline threshold
//! base that decides when an adaptive encoding stops storing values directly
//! and interns them through a lookup table instead.
//!
//! These are configuration, not constants: a store built over an engine with
//! a different key-size ceiling sets them at open time, and the serde factory
//! validates them against each other before any key is written.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum encoded key length in bytes
///
/// Matches the key ceiling of common memory-mapped B-tree engines.
pub const DEFAULT_MAX_KEY_BYTES: usize = 511;

/// Default inline threshold base for adaptive key encoding
pub const DEFAULT_UID_INLINE_BYTES: usize = 32;

/// Size limits enforced by the key encoding layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum encoded key length in bytes (default: 511)
    pub max_key_bytes: usize,

    /// Base byte count under which an adaptive encoding stores the value
    /// inline; the effective threshold adds the configured time width
    /// (default: 32)
    pub uid_inline_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: DEFAULT_MAX_KEY_BYTES,
            uid_inline_bytes: DEFAULT_UID_INLINE_BYTES,
        }
    }
}

impl Limits {
    /// Validate a prefix length against the ceiling left after the time suffix
    ///
    /// `time_bytes` is the fixed trailing time width of the store. Fails with
    /// `KeyTooLong` when the prefix cannot fit.
    pub fn validate_prefix_len(&self, prefix_len: usize, time_bytes: usize) -> Result<(), LimitError> {
        let max = self.max_key_bytes.saturating_sub(time_bytes);
        if prefix_len > max {
            return Err(LimitError::KeyTooLong {
                actual: prefix_len,
                max,
            });
        }
        Ok(())
    }

    /// Validate the limits themselves against a configured time width
    ///
    /// The adaptive encoding's inline threshold is `uid_inline_bytes` plus
    /// the time width, so its largest inline key is
    /// `1 tag byte + uid_inline_bytes + 2 * time`; both that and the
    /// interned form (`1 tag byte + 8 byte uid + time`) must fit under the
    /// key ceiling.
    pub fn validate(&self, time_bytes: usize) -> Result<(), LimitError> {
        let largest_inline = 1 + self.uid_inline_bytes + time_bytes + time_bytes;
        if largest_inline > self.max_key_bytes {
            return Err(LimitError::InvalidLimits {
                reason: "inline threshold leaves no room under the key ceiling",
                max_key_bytes: self.max_key_bytes,
                uid_inline_bytes: self.uid_inline_bytes,
            });
        }
        if self.max_key_bytes < 1 + 8 + time_bytes {
            return Err(LimitError::InvalidLimits {
                reason: "key ceiling cannot hold an interned key",
                max_key_bytes: self.max_key_bytes,
                uid_inline_bytes: self.uid_inline_bytes,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// Encoded key prefix exceeds the remaining key budget
    #[error("Key too long: {actual} bytes exceeds maximum {max}")]
    KeyTooLong {
        /// Actual prefix length in bytes
        actual: usize,
        /// Maximum allowed prefix length
        max: usize,
    },

    /// Configured limits are mutually inconsistent
    #[error(
        "Invalid limits ({reason}): max_key_bytes={max_key_bytes}, uid_inline_bytes={uid_inline_bytes}"
    )]
    InvalidLimits {
        /// Why the combination is rejected
        reason: &'static str,
        /// Configured key ceiling
        max_key_bytes: usize,
        /// Configured inline threshold base
        uid_inline_bytes: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_key_bytes, 511);
        assert_eq!(limits.uid_inline_bytes, 32);
    }

    #[test]
    fn test_prefix_at_limit_ok() {
        let limits = Limits::default();
        assert!(limits.validate_prefix_len(511 - 8, 8).is_ok());
    }

    #[test]
    fn test_prefix_over_limit_rejected() {
        let limits = Limits::default();
        let result = limits.validate_prefix_len(511 - 8 + 1, 8);
        assert!(matches!(
            result,
            Err(LimitError::KeyTooLong { actual, max }) if actual == 504 && max == 503
        ));
    }

    #[test]
    fn test_validate_default_against_time_widths() {
        let limits = Limits::default();
        for time_bytes in [4usize, 8] {
            assert!(limits.validate(time_bytes).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_tiny_ceiling() {
        let limits = Limits {
            max_key_bytes: 16,
            uid_inline_bytes: 32,
        };
        assert!(matches!(
            limits.validate(8),
            Err(LimitError::InvalidLimits { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = LimitError::KeyTooLong { actual: 600, max: 503 };
        assert_eq!(err.to_string(), "Key too long: 600 bytes exceeds maximum 503");
    }
}
