//! Interfaces to the node the miner works for
//!
//! Chain state, block assembly and submission live outside the miner; these
//! traits are the narrow surface it needs from them.

use crate::errors::MiningError;
use consensus_core::block::Block;
use consensus_core::Hash;

/// Snapshot of the local chain head
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainTip {
    pub hash: Hash,
    pub height: u64,
    pub time: i64,
    /// Beat the tip block was anchored to; zero for genesis
    pub beat_hash: Hash,
}

/// Read-only view of the live chain, polled by workers while they search
pub trait ChainView: Send + Sync {
    fn tip(&self) -> ChainTip;

    fn tip_hash(&self) -> Hash {
        self.tip().hash
    }

    /// Network-adjusted unix time
    fn adjusted_time(&self) -> i64;

    fn peer_count(&self) -> usize;

    /// Bits a candidate must carry once its timestamp is refreshed to `time`;
    /// `None` keeps the template's bits
    fn work_required_at(&self, _time: i64) -> Option<u32> {
        None
    }
}

/// Block template construction, coinbase mutation and submission
pub trait BlockAssembler: Send + Sync {
    /// New candidate on top of the current tip, anchored to `beat_hash`
    fn create_block_template(&self, beat_hash: &Hash) -> Result<Block, MiningError>;

    /// Bump the coinbase extra nonce and refresh the merkle root
    fn increment_extra_nonce(&self, block: &mut Block, extra_nonce: &mut u32) -> Result<(), MiningError>;

    /// Returns whether the block was accepted
    fn submit_block(&self, block: &Block) -> Result<bool, MiningError>;
}
