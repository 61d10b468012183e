//! Content hashing for composite cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical. Used to
/// fingerprint file contents and to build the composite key of a package.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental builder for a [`ContentHash`] over several fields.
///
/// Variable-length fields are written with a length prefix so that moving
/// bytes across a field boundary always changes the digest.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Writes a length-prefixed byte field.
    pub fn write_field(&mut self, bytes: &[u8]) -> &mut Self {
        self.state.update(&(bytes.len() as u64).to_le_bytes());
        self.state.update(bytes);
        self
    }

    /// Writes a length-prefixed string field.
    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.write_field(s.as_bytes())
    }

    /// Writes a single fixed-width byte.
    pub fn write_u8(&mut self, byte: u8) -> &mut Self {
        self.state.update(&[byte]);
        self
    }

    /// Writes a fixed-width nested hash.
    pub fn write_hash(&mut self, hash: &ContentHash) -> &mut Self {
        self.state.update(hash.as_bytes());
        self
    }

    /// Finishes hashing and returns the digest.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"hello world");
        let b = ContentHash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"hello");
        let b = ContentHash::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("ContentHash("));
        assert!(s.ends_with(")"));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn hasher_is_deterministic() {
        let digest = |a: &str, b: &str| {
            let mut h = ContentHasher::new();
            h.write_str(a).write_u8(2).write_str(b);
            h.finish()
        };
        assert_eq!(digest("pkg", "file.k"), digest("pkg", "file.k"));
    }

    #[test]
    fn field_boundaries_are_significant() {
        let mut left = ContentHasher::new();
        left.write_str("ab").write_str("c");
        let mut right = ContentHasher::new();
        right.write_str("a").write_str("bc");
        assert_ne!(left.finish(), right.finish());
    }

    #[test]
    fn nested_hash_changes_digest() {
        let inner_a = ContentHash::from_bytes(b"a");
        let inner_b = ContentHash::from_bytes(b"b");
        let mut left = ContentHasher::new();
        left.write_hash(&inner_a);
        let mut right = ContentHasher::new();
        right.write_hash(&inner_b);
        assert_ne!(left.finish(), right.finish());
    }
}
