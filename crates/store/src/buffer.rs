//! Pooled byte buffers
//!
//! Every encode path borrows a buffer from a shared pool instead of mutating
//! serde-owned scratch state. The borrow is scoped by RAII: a `PooledBuf`
//! returns its storage to the pool on drop, so concurrent readers can encode
//! probe keys without racing a writer's buffer.
//!
//! Buffers are bucketed by capacity class (next power of two) so a pool
//! serving mixed key sizes does not fragment.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Shared pool of reusable byte buffers
#[derive(Debug, Default)]
pub struct ByteBufferPool {
    free: Mutex<FxHashMap<usize, Vec<Vec<u8>>>>,
}

impl ByteBufferPool {
    /// Create an empty pool
    pub fn new() -> Arc<Self> {
        Arc::new(ByteBufferPool::default())
    }

    /// Borrow a zeroed buffer of exactly `len` bytes
    ///
    /// The returned guard dereferences to `[u8]` of length `len` and hands
    /// its storage back to the pool when dropped.
    pub fn take(self: &Arc<Self>, len: usize) -> PooledBuf {
        let class = capacity_class(len);
        let mut buf = {
            let mut free = self.free.lock();
            free.get_mut(&class).and_then(Vec::pop)
        }
        .unwrap_or_else(|| Vec::with_capacity(class));
        buf.clear();
        buf.resize(len, 0);
        PooledBuf {
            buf,
            pool: Arc::clone(self),
        }
    }

    fn give_back(&self, mut buf: Vec<u8>) {
        // Pool-owned buffers always have class-sized capacity; anything
        // else came from outside and is dropped.
        let class = buf.capacity();
        if class < 16 || !class.is_power_of_two() {
            return;
        }
        buf.clear();
        let mut free = self.free.lock();
        let bucket = free.entry(class).or_default();
        if bucket.len() < MAX_POOLED_PER_CLASS {
            bucket.push(buf);
        }
    }

    /// Number of buffers currently parked in the pool
    pub fn pooled_count(&self) -> usize {
        self.free.lock().values().map(Vec::len).sum()
    }
}

const MAX_POOLED_PER_CLASS: usize = 64;

fn capacity_class(len: usize) -> usize {
    len.next_power_of_two().max(16)
}

/// RAII guard over a pooled buffer
///
/// Dereferences to the borrowed `[u8]`. Dropping the guard returns the
/// storage to the pool.
#[derive(Debug)]
pub struct PooledBuf {
    buf: Vec<u8>,
    pool: Arc<ByteBufferPool>,
}

impl PooledBuf {
    /// Shorten the buffer to `len` bytes
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Copy the contents into an owned `Vec`
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

impl Deref for PooledBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.give_back(buf);
    }
}

impl AsRef<[u8]> for PooledBuf {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}
