//! Hashing functionality using SHA-1.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Hash digest size in bytes (SHA-1 produces 160-bit hashes).
pub const HASH_SIZE: usize = 20;

/// Length of the abbreviated hash shown in logs and listings.
pub const SHORT_HASH_LEN: usize = 7;

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// SHA-1 over the raw content, no type or length header.
    Sha1,
}

impl Algorithm {
    /// Returns the string representation of the algorithm (for config files).
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
        }
    }

    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "sha1" => Ok(Algorithm::Sha1),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }
}

/// A 20-byte SHA-1 digest naming a blob or a commit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a Hash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a hex string (40 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != HASH_SIZE * 2 {
            return Err(Error::invalid_hash(format!(
                "Expected {} hex characters, got {}",
                HASH_SIZE * 2,
                hex_str.len()
            )));
        }

        let bytes =
            hex::decode(hex_str).map_err(|e| Error::invalid_hash(format!("Invalid hex: {}", e)))?;

        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&bytes);
        Ok(Hash(hash))
    }

    /// Convert to hex string (40 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form used for display.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_HASH_LEN);
        hex
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Hash raw bytes using SHA-1.
    pub fn hash_bytes(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&digest);
        Hash(hash)
    }

    /// Hash data from a reader using SHA-1.
    pub fn hash_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = Sha1::new();
        std::io::copy(&mut reader, &mut hasher)?;
        let digest = hasher.finalize();
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&digest);
        Ok(Hash(hash))
    }

    /// Hash a file using SHA-1.
    pub fn hash_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::hash_reader(file)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Hash::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty() {
        let hash = Hash::hash_bytes(b"");
        assert_eq!(hash.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_hash_hello_world() {
        let hash = Hash::hash_bytes(b"hello world");
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 40);

        // SHA-1 of "hello world"
        assert_eq!(hex, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[test]
    fn test_hash_reader_matches_bytes() {
        let data = b"some file content\nline two\n";
        let from_reader = Hash::hash_reader(&data[..]).unwrap();
        assert_eq!(from_reader, Hash::hash_bytes(data));
    }

    #[test]
    fn test_hash_from_hex_invalid_length() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("").is_err());
    }

    #[test]
    fn test_hash_from_hex_invalid_chars() {
        let invalid = "z".repeat(40);
        assert!(Hash::from_hex(&invalid).is_err());
    }

    #[test]
    fn test_short_hash() {
        let hash = Hash::hash_bytes(b"hello world");
        assert_eq!(hash.short(), "2aae6c3");
    }

    #[test]
    fn test_hash_serde_as_hex_string() {
        let hash = Hash::hash_bytes(b"hello world");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"2aae6c35c94fcfb415dbe95f408b9ce91ee846ed\"");

        let parsed: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);

        assert!(serde_json::from_str::<Hash>("\"not-a-hash\"").is_err());
    }

    #[test]
    fn test_algorithm_conversions() {
        let algo = Algorithm::Sha1;
        assert_eq!(algo.as_str(), "sha1");
        assert_eq!(Algorithm::parse("sha1").unwrap(), Algorithm::Sha1);
        assert!(Algorithm::parse("blake3-256").is_err());
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Hashing the same data always produces the same hash
        #[test]
        fn prop_hash_deterministic(data: Vec<u8>) {
            let hash1 = Hash::hash_bytes(&data);
            let hash2 = Hash::hash_bytes(&data);
            prop_assert_eq!(hash1, hash2);
        }

        /// Round-trip through hex preserves the hash
        #[test]
        fn prop_hex_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
            let hash = Hash::from_bytes(bytes);
            let parsed = Hash::from_hex(&hash.to_hex())?;
            prop_assert_eq!(hash, parsed);
        }

        /// The short form is always a prefix of the full hex
        #[test]
        fn prop_short_is_prefix(bytes in prop::array::uniform20(any::<u8>())) {
            let hash = Hash::from_bytes(bytes);
            prop_assert!(hash.to_hex().starts_with(&hash.short()));
            prop_assert_eq!(hash.short().len(), SHORT_HASH_LEN);
        }

        /// Invalid hex length always fails
        #[test]
        fn prop_invalid_hex_length_fails(
            s in "[0-9a-f]{0,39}|[0-9a-f]{41,80}"
        ) {
            prop_assert!(Hash::from_hex(&s).is_err());
        }
    }
}
