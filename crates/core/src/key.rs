//! Temporal key model
//!
//! A `TemporalKey` is the logical entity every key serde converts to and
//! from: a typed prefix plus an instant. The prefix is either one scalar
//! `Val` or an ordered list of named tags.
//!
//! ## Contract
//!
//! - The prefix is never absent.
//! - Tag lists are sorted by tag name at construction. Sorted order is a type
//!   invariant: two logically identical tag sets compare equal and encode to
//!   identical bytes regardless of the order the caller supplied them in.

use crate::{Timestamp, Val};
use serde::{Deserialize, Serialize};

/// A named tag within a composite key prefix
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name, the sort key within a tag set
    pub name: String,
    /// Tag value
    pub value: Val,
}

impl Tag {
    /// Create a new tag
    pub fn new(name: impl Into<String>, value: impl Into<Val>) -> Self {
        Tag {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Key prefix: a single scalar value or a sorted list of tags
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyPrefix {
    /// Single typed scalar prefix
    Value(Val),
    /// Composite prefix of named tags, sorted by name
    Tags(Vec<Tag>),
}

impl KeyPrefix {
    /// Create a scalar prefix
    pub fn value(val: impl Into<Val>) -> Self {
        KeyPrefix::Value(val.into())
    }

    /// Create a tag-list prefix
    ///
    /// Tags are sorted by name here, once, so every consumer observes the
    /// same canonical order. Duplicate names are kept in the order sorting
    /// leaves them in; the store treats the full sorted list as the identity.
    pub fn tags(mut tags: Vec<Tag>) -> Self {
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        KeyPrefix::Tags(tags)
    }

    /// Get the scalar value if this is a `Value` prefix
    pub fn as_val(&self) -> Option<&Val> {
        match self {
            KeyPrefix::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Get the tag list if this is a `Tags` prefix
    pub fn as_tags(&self) -> Option<&[Tag]> {
        match self {
            KeyPrefix::Tags(t) => Some(t),
            _ => None,
        }
    }
}

/// The logical temporal key: typed prefix plus instant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemporalKey {
    /// Key prefix, never absent
    pub prefix: KeyPrefix,
    /// Instant the key refers to
    pub time: Timestamp,
}

impl TemporalKey {
    /// Create a temporal key
    pub fn new(prefix: KeyPrefix, time: Timestamp) -> Self {
        TemporalKey { prefix, time }
    }

    /// Create a temporal key with a scalar prefix
    pub fn of(val: impl Into<Val>, time: Timestamp) -> Self {
        TemporalKey {
            prefix: KeyPrefix::Value(val.into()),
            time,
        }
    }
}
