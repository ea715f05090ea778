//! Content hashing for netlist fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 digest.
///
/// Lowering is deterministic, so two runs over the same inputs must produce
/// modules with equal fingerprints. Tests and callers compare these rather
/// than whole netlists.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Hashes a sequence of byte slices as one stream.
    ///
    /// Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]`
    /// hash differently.
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Xxh3::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(hasher.digest128().to_le_bytes())
    }

    /// Returns the first eight hex digits, for log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
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
        write!(f, "ContentHash({}..)", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(
            ContentHash::from_bytes(b"SB_IO"),
            ContentHash::from_bytes(b"SB_IO")
        );
    }

    #[test]
    fn parts_are_length_prefixed() {
        let a = ContentHash::from_parts([b"ab".as_slice(), b"c".as_slice()]);
        let b = ContentHash::from_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_short() {
        let h = ContentHash::from_bytes(b"por");
        let s = h.to_string();
        assert_eq!(s.len(), 32);
        assert!(s.starts_with(&h.short()));
        assert_eq!(h.short().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"fingerprint");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
