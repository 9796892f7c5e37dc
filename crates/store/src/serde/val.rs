//! Byte-level value codec
//!
//! Encodes a [`Val`] as `[1-byte type tag][payload]`: fixed widths for
//! primitives, raw UTF-8 for strings, 8-byte microseconds for dates. All
//! multi-byte integers are big-endian.
//!
//! ## Additions
//!
//! `write_val` can reserve zeroed slots before and after the encoding
//! (`Additions`). Callers that need to frame the value - a variant tag in
//! front, a time suffix behind - stamp those slots in place instead of
//! re-serializing or copying. The adaptive serde's direct path is built on
//! this: one buffer, laid out once, becomes the complete key.

use crate::buffer::{ByteBufferPool, PooledBuf};
use crate::error::{hex, Result, StoreError};
use byteorder::{BigEndian, ByteOrder};
use std::sync::Arc;
use tempokv_core::{Timestamp, Val};

/// Type tag bytes. Zero is reserved so an accidentally zeroed buffer can
/// never decode as a value.
const TAG_BOOL: u8 = 1;
const TAG_BYTE: u8 = 2;
const TAG_SHORT: u8 = 3;
const TAG_INT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_FLOAT: u8 = 6;
const TAG_DOUBLE: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_DATE: u8 = 9;

/// Reserved zeroed slots around an encoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Additions {
    /// Bytes reserved before the encoding
    pub prefix: usize,
    /// Bytes reserved after the encoding
    pub suffix: usize,
}

impl Additions {
    /// No reserved slots
    pub const NONE: Additions = Additions { prefix: 0, suffix: 0 };

    /// Reserve `prefix` bytes in front and `suffix` bytes behind
    pub fn new(prefix: usize, suffix: usize) -> Self {
        Additions { prefix, suffix }
    }
}

/// Encoded length of a value, tag byte included
pub fn encoded_len(val: &Val) -> usize {
    1 + match val {
        Val::Bool(_) | Val::Byte(_) => 1,
        Val::Short(_) => 2,
        Val::Int(_) | Val::Float(_) => 4,
        Val::Long(_) | Val::Double(_) | Val::Date(_) => 8,
        Val::String(s) => s.len(),
    }
}

/// Encode `val` into a pooled buffer, with reserved addition slots
///
/// The returned buffer is `additions.prefix + encoded_len(val) +
/// additions.suffix` bytes; the value occupies the middle slice and the
/// addition slots are zeroed.
pub fn write_val(pool: &Arc<ByteBufferPool>, val: &Val, additions: Additions) -> PooledBuf {
    let len = encoded_len(val);
    let mut buf = pool.take(additions.prefix + len + additions.suffix);
    let out = &mut buf[additions.prefix..additions.prefix + len];
    match val {
        Val::Bool(b) => {
            out[0] = TAG_BOOL;
            out[1] = u8::from(*b);
        }
        Val::Byte(b) => {
            out[0] = TAG_BYTE;
            out[1] = *b as u8;
        }
        Val::Short(s) => {
            out[0] = TAG_SHORT;
            BigEndian::write_i16(&mut out[1..], *s);
        }
        Val::Int(i) => {
            out[0] = TAG_INT;
            BigEndian::write_i32(&mut out[1..], *i);
        }
        Val::Long(l) => {
            out[0] = TAG_LONG;
            BigEndian::write_i64(&mut out[1..], *l);
        }
        Val::Float(f) => {
            out[0] = TAG_FLOAT;
            BigEndian::write_u32(&mut out[1..], f.to_bits());
        }
        Val::Double(d) => {
            out[0] = TAG_DOUBLE;
            BigEndian::write_u64(&mut out[1..], d.to_bits());
        }
        Val::String(s) => {
            out[0] = TAG_STRING;
            out[1..].copy_from_slice(s.as_bytes());
        }
        Val::Date(t) => {
            out[0] = TAG_DATE;
            BigEndian::write_u64(&mut out[1..], t.as_micros());
        }
    }
    buf
}

/// Encode a string the way `write_val(Val::String)` does, without cloning
/// the string into a `Val`
pub fn write_string(pool: &Arc<ByteBufferPool>, s: &str, additions: Additions) -> PooledBuf {
    let len = 1 + s.len();
    let mut buf = pool.take(additions.prefix + len + additions.suffix);
    let out = &mut buf[additions.prefix..additions.prefix + len];
    out[0] = TAG_STRING;
    out[1..].copy_from_slice(s.as_bytes());
    buf
}

fn expect_payload(bytes: &[u8], want: usize, what: &str) -> Result<()> {
    // Payload length is implied by the tag, so a mismatch means framing is
    // broken, not just truncated.
    if bytes.len() - 1 != want {
        return Err(StoreError::Decode(format!(
            "{} payload is {} bytes, expected {}: [{}]",
            what,
            bytes.len() - 1,
            want,
            hex(bytes)
        )));
    }
    Ok(())
}

/// Decode a value encoded by [`write_val`] (no addition slots)
pub fn read_val(bytes: &[u8]) -> Result<Val> {
    let Some(&tag) = bytes.first() else {
        return Err(StoreError::Decode("empty value encoding".to_string()));
    };
    match tag {
        TAG_BOOL => {
            expect_payload(bytes, 1, "bool")?;
            match bytes[1] {
                0 => Ok(Val::Bool(false)),
                1 => Ok(Val::Bool(true)),
                other => Err(StoreError::Decode(format!(
                    "bool payload byte {other} is neither 0 nor 1"
                ))),
            }
        }
        TAG_BYTE => {
            expect_payload(bytes, 1, "byte")?;
            Ok(Val::Byte(bytes[1] as i8))
        }
        TAG_SHORT => {
            expect_payload(bytes, 2, "short")?;
            Ok(Val::Short(BigEndian::read_i16(&bytes[1..])))
        }
        TAG_INT => {
            expect_payload(bytes, 4, "int")?;
            Ok(Val::Int(BigEndian::read_i32(&bytes[1..])))
        }
        TAG_LONG => {
            expect_payload(bytes, 8, "long")?;
            Ok(Val::Long(BigEndian::read_i64(&bytes[1..])))
        }
        TAG_FLOAT => {
            expect_payload(bytes, 4, "float")?;
            Ok(Val::Float(f32::from_bits(BigEndian::read_u32(&bytes[1..]))))
        }
        TAG_DOUBLE => {
            expect_payload(bytes, 8, "double")?;
            Ok(Val::Double(f64::from_bits(BigEndian::read_u64(&bytes[1..]))))
        }
        TAG_STRING => {
            let s = std::str::from_utf8(&bytes[1..])
                .map_err(|e| StoreError::Decode(format!("invalid UTF-8 in string: {e}")))?;
            Ok(Val::String(s.to_string()))
        }
        TAG_DATE => {
            expect_payload(bytes, 8, "date")?;
            Ok(Val::Date(Timestamp::from_micros(BigEndian::read_u64(
                &bytes[1..],
            ))))
        }
        other => Err(StoreError::Decode(format!(
            "unknown value type tag {other}: [{}]",
            hex(bytes)
        ))),
    }
}
