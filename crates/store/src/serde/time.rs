//! Fixed-width time suffix encodings
//!
//! One serde per configurable precision. All encodings are big-endian
//! unsigned, so lexicographic byte order over the suffix equals
//! chronological order and time-range scans work by byte comparison alone.
//!
//! Writing truncates the timestamp to the precision's unit; that truncation
//! is the stored semantics, not a lossy accident - a store configured for
//! seconds genuinely keys on whole seconds.

use byteorder::{BigEndian, ByteOrder};
use tempokv_core::Timestamp;

/// Fixed-width encode/decode of an instant
///
/// `write` and `read` operate on exactly `size()` bytes; every key serde
/// slices the trailing `size()` bytes of a key to isolate the suffix.
pub trait TimeSerde: Send + Sync {
    /// Fixed byte width of the suffix
    fn size(&self) -> usize;

    /// Encode `time` into `buf` (`buf.len() == size()`)
    fn write(&self, buf: &mut [u8], time: Timestamp);

    /// Decode the suffix in `buf` (`buf.len() == size()`)
    fn read(&self, buf: &[u8]) -> Timestamp;
}

/// 8-byte nanosecond suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct NanosecondTimeSerde;

impl TimeSerde for NanosecondTimeSerde {
    fn size(&self) -> usize {
        8
    }

    fn write(&self, buf: &mut [u8], time: Timestamp) {
        BigEndian::write_u64(buf, time.as_micros().saturating_mul(1_000));
    }

    fn read(&self, buf: &[u8]) -> Timestamp {
        Timestamp::from_micros(BigEndian::read_u64(buf) / 1_000)
    }
}

/// 8-byte millisecond suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct MillisecondTimeSerde;

impl TimeSerde for MillisecondTimeSerde {
    fn size(&self) -> usize {
        8
    }

    fn write(&self, buf: &mut [u8], time: Timestamp) {
        BigEndian::write_u64(buf, time.as_millis());
    }

    fn read(&self, buf: &[u8]) -> Timestamp {
        Timestamp::from_millis(BigEndian::read_u64(buf))
    }
}

/// 4-byte second suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondTimeSerde;

impl TimeSerde for SecondTimeSerde {
    fn size(&self) -> usize {
        4
    }

    fn write(&self, buf: &mut [u8], time: Timestamp) {
        BigEndian::write_u32(buf, time.as_secs() as u32);
    }

    fn read(&self, buf: &[u8]) -> Timestamp {
        Timestamp::from_secs(BigEndian::read_u32(buf) as u64)
    }
}

/// 4-byte minute suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct MinuteTimeSerde;

impl TimeSerde for MinuteTimeSerde {
    fn size(&self) -> usize {
        4
    }

    fn write(&self, buf: &mut [u8], time: Timestamp) {
        BigEndian::write_u32(buf, (time.as_secs() / 60) as u32);
    }

    fn read(&self, buf: &[u8]) -> Timestamp {
        Timestamp::from_secs(BigEndian::read_u32(buf) as u64 * 60)
    }
}

/// 4-byte hour suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct HourTimeSerde;

impl TimeSerde for HourTimeSerde {
    fn size(&self) -> usize {
        4
    }

    fn write(&self, buf: &mut [u8], time: Timestamp) {
        BigEndian::write_u32(buf, (time.as_secs() / 3_600) as u32);
    }

    fn read(&self, buf: &[u8]) -> Timestamp {
        Timestamp::from_secs(BigEndian::read_u32(buf) as u64 * 3_600)
    }
}

/// 4-byte day suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct DayTimeSerde;

impl TimeSerde for DayTimeSerde {
    fn size(&self) -> usize {
        4
    }

    fn write(&self, buf: &mut [u8], time: Timestamp) {
        BigEndian::write_u32(buf, (time.as_secs() / 86_400) as u32);
    }

    fn read(&self, buf: &[u8]) -> Timestamp {
        Timestamp::from_secs(BigEndian::read_u32(buf) as u64 * 86_400)
    }
}
