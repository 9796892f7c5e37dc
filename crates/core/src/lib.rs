//! Core types for TempoKV
//!
//! This crate defines the domain model shared by every layer of the store:
//! - `Val`: the typed scalar value that forms a key prefix
//! - `Timestamp`: microsecond-precision instant
//! - `TemporalKey` / `KeyPrefix` / `Tag`: the logical key entity
//! - `Limits`: configurable size ceilings enforced by the encoding layer
//!
//! No storage or encoding logic lives here - only the value model and its
//! invariants.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod key;
pub mod limits;
pub mod timestamp;
pub mod value;

pub use key::{KeyPrefix, Tag, TemporalKey};
pub use limits::{LimitError, Limits};
pub use timestamp::Timestamp;
pub use value::Val;
