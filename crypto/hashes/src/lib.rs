pub mod hasher;
pub mod merkle;

// Re-export commonly used types
pub use hasher::{double_sha256, sha256, HashWriter, Hashable};
pub use merkle::MerkleTree;

use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::hash::Hash as StdHash;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

pub const HASH_SIZE: usize = 32;

/// A 32-byte hash wrapper used across the project.
///
/// Hex form is the byte order as stored; a hash parsed from a node's RPC reply
/// formats back to the same string.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl Hash {
    /// Create a hash from a 32-byte array
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns raw bytes
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Creates a zeroed hash
    pub const fn zeroed() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Constructs a hash from four little-endian u64s (used in tests)
    pub const fn from_le_u64(parts: [u64; 4]) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let mut i = 0;
        while i < 4 {
            let part = parts[i];
            let mut j = 0;
            while j < 8 {
                bytes[i * 8 + j] = ((part >> (8 * j)) & 0xFF) as u8;
                j += 1;
            }
            i += 1;
        }
        Self(bytes)
    }

    /// Tries to create a Hash from a slice of bytes
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, HashParseError> {
        let array: [u8; HASH_SIZE] = slice
            .try_into()
            .map_err(|_| HashParseError::InvalidLength(slice.len()))?;
        Ok(Self(array))
    }

    /// Hex string of the hash bytes
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; HASH_SIZE] {
    fn from(h: Hash) -> Self {
        h.0
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl StdHash for Hash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // use the last u64 as a fast hasher source
        let mut le = [0u8; 8];
        le.copy_from_slice(&self.0[24..32]);
        u64::from_le_bytes(le).hash(state);
    }
}

impl Deref for Hash {
    type Target = [u8; HASH_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl hasher::Hashable for Hash {
    fn hash_into(&self, state: &mut sha2::Sha256) {
        state.update(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_le_u64_roundtrip() {
        let h = Hash::from_le_u64([1, 2, 3, 4]);
        let bytes = h.as_bytes();
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &2u64.to_le_bytes());
        assert_eq!(&bytes[24..32], &4u64.to_le_bytes());
    }

    #[test]
    fn parse_rpc_hex_preserves_display_form() {
        let hex = "000000000000000000052d314a259755ca65944e68df6b12a067ea8f1f5a7091";
        let hash: Hash = hex.parse().unwrap();
        assert_eq!(hash.to_string(), hex);
        assert!(!hash.is_zero());
    }

    #[test]
    fn parse_rejects_wrong_length_and_bad_hex() {
        assert_eq!("abcd".parse::<Hash>(), Err(HashParseError::InvalidLength(2)));
        assert!(matches!("zz".parse::<Hash>(), Err(HashParseError::InvalidHex(_))));
    }
}
