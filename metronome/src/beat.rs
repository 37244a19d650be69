use crypto_hashes::Hash;
use serde::{Deserialize, Serialize};

/// One block of the metronome chain.
///
/// `next_hash` stays `None` until a query observes that the metronome chain
/// has moved past this beat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub hash: Hash,
    /// Unix timestamp of the metronome block
    pub block_time: i64,
    pub height: i64,
    pub next_hash: Option<Hash>,
}

impl Beat {
    pub fn new(hash: Hash, block_time: i64, height: i64, next_hash: Option<Hash>) -> Self {
        Self { hash, block_time, height, next_hash }
    }

    /// True once the metronome chain is known to continue past this beat
    pub fn has_successor(&self) -> bool {
        self.next_hash.is_some()
    }
}
