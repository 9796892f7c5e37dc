//! Composite sorted-tag key serde
//!
//! A tags key is a set of name/value pairs, all interned through one shared
//! uid lookup table with the tag-name set itself a first-class interned
//! entity:
//!
//! 1. each tag name is interned, and the concatenation of the name uids (in
//!    sorted tag order) is interned again, yielding one `tag_set_uid` that
//!    stands for "this exact combination of tag names";
//! 2. each tag value is interned individually;
//! 3. the key is `[tag_set_uid][value uid...][time]`.
//!
//! Every key sharing the same tag names - whatever their values - reuses
//! the same tag-set entry. Decoding walks the stored name-uid list in
//! lock-step with the value uids in the key. The GC recorder must trace all
//! three levels (set uid, member name uids, value uids) or a sweep would
//! reclaim a name set still referenced transitively.

use crate::buffer::{ByteBufferPool, PooledBuf};
use crate::env::{ReadOps, WriteTxn};
use crate::error::{hex, Result, StoreError};
use crate::lookup::{UidLookupDb, UsedLookupsRecorder, UID_LEN};
use crate::serde::time::TimeSerde;
use crate::serde::val::{read_val, write_string, write_val, Additions};
use crate::serde::{split_time, TemporalKeySerde};
use smallvec::SmallVec;
use std::sync::Arc;
use tempokv_core::{KeyPrefix, Tag, TemporalKey};

/// Scratch capacity for a typical tag-name-uid concatenation (8 tags)
type NameUidBuf = SmallVec<[u8; 8 * UID_LEN]>;

/// Composite sorted-tag key serde over one shared uid lookup table
pub struct TagsKeySerde {
    uid_db: UidLookupDb,
    pool: Arc<ByteBufferPool>,
    time_serde: Arc<dyn TimeSerde>,
}

impl TagsKeySerde {
    /// Create a serde over the given uid table
    pub fn new(uid_db: UidLookupDb, pool: Arc<ByteBufferPool>, time_serde: Arc<dyn TimeSerde>) -> Self {
        TagsKeySerde {
            uid_db,
            pool,
            time_serde,
        }
    }

    fn tags_prefix<'a>(key: &'a TemporalKey) -> Result<&'a [Tag]> {
        key.prefix.as_tags().ok_or(StoreError::KeyTypeMismatch {
            expected: "Tags",
            actual: "scalar",
        })
    }

    fn assemble(&self, set_uid: &[u8], value_uids: &[u8], key: &TemporalKey) -> PooledBuf {
        let size = self.time_serde.size();
        let mut buf = self.pool.take(UID_LEN + value_uids.len() + size);
        buf[..UID_LEN].copy_from_slice(set_uid);
        buf[UID_LEN..UID_LEN + value_uids.len()].copy_from_slice(value_uids);
        self.time_serde
            .write(&mut buf[UID_LEN + value_uids.len()..], key.time);
        buf
    }
}

impl TemporalKeySerde for TagsKeySerde {
    fn write(&self, txn: &mut WriteTxn<'_>, key: &TemporalKey) -> Result<PooledBuf> {
        // KeyPrefix::tags sorted these at construction.
        let tags = Self::tags_prefix(key)?;

        // Intern the name set: one uid per name, then one uid for the
        // concatenation.
        let mut name_uids = NameUidBuf::new();
        for tag in tags {
            let name_bytes = write_string(&self.pool, &tag.name, Additions::NONE);
            name_uids.extend_from_slice(&self.uid_db.put(txn, &name_bytes));
        }
        let set_uid = self.uid_db.put(txn, &name_uids);

        // Intern each value in the same order.
        let mut value_uids = NameUidBuf::new();
        for tag in tags {
            let value_bytes = write_val(&self.pool, &tag.value, Additions::NONE);
            value_uids.extend_from_slice(&self.uid_db.put(txn, &value_bytes));
        }

        Ok(self.assemble(&set_uid, &value_uids, key))
    }

    fn read(&self, txn: &dyn ReadOps, bytes: &[u8]) -> Result<TemporalKey> {
        let (prefix, time) = split_time(bytes, self.time_serde.as_ref())?;
        if prefix.len() < UID_LEN || (prefix.len() - UID_LEN) % UID_LEN != 0 {
            return Err(StoreError::CorruptKey {
                detail: format!("tags prefix length {} is not a uid multiple", prefix.len()),
                bytes: hex(bytes),
            });
        }

        let set_uid = &prefix[..UID_LEN];
        let name_set = self
            .uid_db
            .get_value(txn, set_uid)
            .ok_or_else(|| StoreError::LookupMiss { id: hex(set_uid) })?;
        if name_set.len() % UID_LEN != 0 {
            return Err(StoreError::CorruptKey {
                detail: format!("tag name set length {} is not a uid multiple", name_set.len()),
                bytes: hex(bytes),
            });
        }

        let value_uids = &prefix[UID_LEN..];
        let name_count = name_set.len() / UID_LEN;
        let value_count = value_uids.len() / UID_LEN;
        if name_count != value_count {
            return Err(StoreError::CorruptKey {
                detail: format!(
                    "tag arity mismatch: {name_count} names, {value_count} values"
                ),
                bytes: hex(bytes),
            });
        }

        let mut tags = Vec::with_capacity(name_count);
        for (name_uid, value_uid) in name_set
            .chunks_exact(UID_LEN)
            .zip(value_uids.chunks_exact(UID_LEN))
        {
            let name_bytes = self
                .uid_db
                .get_value(txn, name_uid)
                .ok_or_else(|| StoreError::LookupMiss { id: hex(name_uid) })?;
            let name = match read_val(name_bytes)? {
                tempokv_core::Val::String(s) => s,
                other => {
                    return Err(StoreError::CorruptKey {
                        detail: format!("tag name decoded as {}, expected String", other.type_name()),
                        bytes: hex(bytes),
                    })
                }
            };
            let value_bytes = self
                .uid_db
                .get_value(txn, value_uid)
                .ok_or_else(|| StoreError::LookupMiss { id: hex(value_uid) })?;
            let value = read_val(value_bytes)?;
            tags.push(Tag { name, value });
        }

        Ok(TemporalKey::new(KeyPrefix::tags(tags), time))
    }

    fn to_buffer_for_get(
        &self,
        txn: &dyn ReadOps,
        key: &TemporalKey,
    ) -> Result<Option<PooledBuf>> {
        let tags = Self::tags_prefix(key)?;

        // Every level is a plain get: a miss anywhere means no stored key
        // can reference this tag set, so the whole probe is absent.
        let mut name_uids = NameUidBuf::new();
        for tag in tags {
            let name_bytes = write_string(&self.pool, &tag.name, Additions::NONE);
            match self.uid_db.get(txn, &name_bytes) {
                Some(uid) => name_uids.extend_from_slice(&uid),
                None => return Ok(None),
            }
        }
        let Some(set_uid) = self.uid_db.get(txn, &name_uids) else {
            return Ok(None);
        };

        let mut value_uids = NameUidBuf::new();
        for tag in tags {
            let value_bytes = write_val(&self.pool, &tag.value, Additions::NONE);
            match self.uid_db.get(txn, &value_bytes) {
                Some(uid) => value_uids.extend_from_slice(&uid),
                None => return Ok(None),
            }
        }

        Ok(Some(self.assemble(&set_uid, &value_uids, key)))
    }

    fn uses_lookup(&self, _bytes: &[u8]) -> bool {
        true
    }

    fn used_lookups_recorder(&self) -> Box<dyn UsedLookupsRecorder> {
        Box::new(TagsKeyRecorder {
            uid_db: self.uid_db.clone(),
            time_size: self.time_serde.size(),
        })
    }
}

/// Recorder tracing all three interning levels of a tags key
struct TagsKeyRecorder {
    uid_db: UidLookupDb,
    time_size: usize,
}

impl UsedLookupsRecorder for TagsKeyRecorder {
    fn record_used(&self, txn: &mut WriteTxn<'_>, key_bytes: &[u8]) -> Result<()> {
        if key_bytes.len() < UID_LEN + self.time_size {
            return Err(StoreError::CorruptKey {
                detail: "tags key shorter than set uid plus time suffix".to_string(),
                bytes: hex(key_bytes),
            });
        }
        let prefix = &key_bytes[..key_bytes.len() - self.time_size];
        let set_uid = &prefix[..UID_LEN];

        // Level 1: the tag-set entry itself. Copy the stored name set out
        // before staging mutations.
        let name_set = self
            .uid_db
            .get_value(txn, set_uid)
            .ok_or_else(|| StoreError::LookupMiss { id: hex(set_uid) })?
            .to_vec();
        self.uid_db.record_used(txn, set_uid);

        // Level 2: every tag name inside the set.
        for name_uid in name_set.chunks_exact(UID_LEN) {
            self.uid_db.record_used(txn, name_uid);
        }

        // Level 3: every tag value in the key.
        for value_uid in prefix[UID_LEN..].chunks_exact(UID_LEN) {
            self.uid_db.record_used(txn, value_uid);
        }
        Ok(())
    }

    fn delete_unused(&self, txn: &mut WriteTxn<'_>) -> Result<usize> {
        Ok(self.uid_db.delete_unused(txn))
    }
}
