use serde::{Deserialize, Serialize};

use crate::hashing;
use crate::Hash;

/// Block header. Besides the usual proof-of-work fields it commits to the
/// metronome beat the block was mined against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    /// Hash of the metronome beat this block is anchored to
    pub metronome_hash: Hash,
    /// Unix timestamp in seconds
    pub time: u32,
    /// Compact difficulty target
    pub bits: u32,
    pub nonce: u32,
}

impl Header {
    pub fn new(
        version: i32,
        prev_block_hash: Hash,
        merkle_root: Hash,
        metronome_hash: Hash,
        time: u32,
        bits: u32,
        nonce: u32,
    ) -> Self {
        Self { version, prev_block_hash, merkle_root, metronome_hash, time, bits, nonce }
    }

    /// Content hash of the header; this is also the proof-of-work hash
    pub fn hash(&self) -> Hash {
        hashing::header::calculate_header_hash(self)
    }

    pub fn block_time(&self) -> i64 {
        i64::from(self.time)
    }
}
