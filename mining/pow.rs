//! Proof-of-Work implementation using double SHA256 hashing
//!
//! Compact target encoding follows the exponent+mantissa form used by the
//! block header `bits` field, including its sign and overflow flags.

use consensus_core::header::Header;
use consensus_core::Hash;
use crypto_hashes::double_sha256;
use primitive_types::U256;
use std::cmp::Ordering;

/// Target represents the difficulty threshold for valid blocks
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Target(U256);

/// Decoded compact target together with its validity flags
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CompactTarget {
    pub target: Target,
    pub negative: bool,
    pub overflow: bool,
}

impl Target {
    /// Creates a new Target from a U256 value
    pub fn new(value: U256) -> Self {
        Target(value)
    }

    /// Decodes compact bits, reporting the sign bit and overflow
    /// Format: [1 byte exponent][3 bytes mantissa, top bit is sign]
    pub fn decode_compact(bits: u32) -> CompactTarget {
        let size = bits >> 24;
        let mut word = bits & 0x007f_ffff;

        let negative = word != 0 && (bits & 0x0080_0000) != 0;
        let overflow = word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        let value = if overflow {
            U256::zero()
        } else if size <= 3 {
            word >>= 8 * (3 - size);
            U256::from(word)
        } else {
            U256::from(word) << (8 * (size - 3) as usize)
        };

        CompactTarget { target: Target(value), negative, overflow }
    }

    /// Creates a Target from compact bits, ignoring sign and overflow
    pub fn from_bits(bits: u32) -> Self {
        Self::decode_compact(bits).target
    }

    /// Converts Target to compact bits representation
    pub fn to_bits(&self) -> u32 {
        let mut size = (self.0.bits() as u32 + 7) / 8;
        let mut compact = if size <= 3 {
            (self.0.low_u64() << (8 * (3 - size))) as u32
        } else {
            (self.0 >> (8 * (size - 3) as usize)).low_u64() as u32
        };

        // the mantissa's top bit is the sign, so shift it out
        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }

        compact | (size << 24)
    }

    /// Returns the inner U256 value
    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<U256> for Target {
    fn from(value: U256) -> Self {
        Target(value)
    }
}

impl From<Target> for U256 {
    fn from(target: Target) -> Self {
        target.0
    }
}

/// Proof-of-Work handler
pub struct ProofOfWork;

impl ProofOfWork {
    /// Computes the SHA256(SHA256(header)) hash of serialized header bytes
    pub fn compute_hash(header_bytes: &[u8]) -> Hash {
        Hash::from(double_sha256(header_bytes))
    }

    /// Hash as an unsigned 256-bit number
    pub fn hash_to_u256(hash: &Hash) -> U256 {
        U256::from_big_endian(hash.as_bytes())
    }

    /// True if `hash` is numerically at or below `target`
    pub fn meets_target(hash: &Hash, target: &Target) -> bool {
        Self::hash_to_u256(hash) <= target.0
    }

    /// Checks the header against the target decoded from its own `bits`.
    /// Used on the hot path; range checks are done once per job.
    pub fn is_valid_pow(header: &Header) -> bool {
        Self::meets_target(&header.hash(), &Target::from_bits(header.bits))
    }

    /// Full consensus check: rejects negative, zero, overflowing or
    /// above-limit targets before comparing the hash
    pub fn check_proof_of_work(hash: &Hash, bits: u32, pow_limit: U256) -> bool {
        let decoded = Target::decode_compact(bits);
        if decoded.negative || decoded.overflow || decoded.target.0.is_zero() || decoded.target.0 > pow_limit {
            return false;
        }
        Self::meets_target(hash, &decoded.target)
    }

    /// Calculates the hash rate (hashes per second)
    pub fn calculate_hash_rate(hashes: u64, duration_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 0.0;
        }
        (hashes as f64) / (duration_ms as f64 / 1000.0)
    }

    /// Compares hash against target and returns ordering
    pub fn compare_hash_to_target(hash: &Hash, target: &Target) -> Ordering {
        Self::hash_to_u256(hash).cmp(&target.0)
    }
}
