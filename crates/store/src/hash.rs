//! Content hashing for the hash lookup table

use crate::schema::HashLength;
use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_64;

/// Produces fixed-width big-endian content hashes
///
/// The width is configuration (`HashLength`): 4 bytes keeps interned keys
/// small at a higher clash rate, 8 bytes makes clashes rare. Clash handling
/// is the lookup table's job either way.
#[derive(Debug, Clone, Copy)]
pub struct HashFactory {
    length: HashLength,
}

impl HashFactory {
    /// Create a factory for the configured hash width
    pub fn new(length: HashLength) -> Self {
        HashFactory { length }
    }

    /// Hash width in bytes
    pub fn hash_len(&self) -> usize {
        match self.length {
            HashLength::Integer => 4,
            HashLength::Long => 8,
        }
    }

    /// Hash `bytes` to a fixed-width big-endian id
    pub fn hash(&self, bytes: &[u8]) -> SmallVec<[u8; 8]> {
        let h = xxh3_64(bytes);
        match self.length {
            HashLength::Integer => SmallVec::from_slice(&(h as u32).to_be_bytes()),
            HashLength::Long => SmallVec::from_slice(&h.to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_width_matches_config() {
        assert_eq!(HashFactory::new(HashLength::Integer).hash(b"x").len(), 4);
        assert_eq!(HashFactory::new(HashLength::Long).hash(b"x").len(), 8);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let f = HashFactory::new(HashLength::Long);
        assert_eq!(f.hash(b"value"), f.hash(b"value"));
        assert_ne!(f.hash(b"value"), f.hash(b"other"));
    }

    #[test]
    fn test_integer_hash_is_truncation_of_long() {
        let int = HashFactory::new(HashLength::Integer).hash(b"abc");
        let long = HashFactory::new(HashLength::Long).hash(b"abc");
        assert_eq!(&int[..], &long[4..]);
    }
}
