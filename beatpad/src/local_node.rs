//! Standalone node backing the miner
//!
//! Keeps an in-memory header chain from a deterministic genesis, builds
//! templates paying a single coinbase output, and accepts submitted blocks
//! after checking parent, structure, difficulty, proof of work and that the
//! anchoring beat exists on the metronome chain.

use consensus_core::block::Block;
use consensus_core::config::Params;
use consensus_core::constants::{BLOCK_VERSION, COIN, INITIAL_BLOCK_REWARD, SUBSIDY_HALVING_INTERVAL};
use consensus_core::errors::ConsensusError;
use consensus_core::header::Header;
use consensus_core::tx::Transaction;
use consensus_core::{Hash, ZERO_HASH};
use metronome::BeatSource;
use mining::prelude::*;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Genesis coinbase script, independent of the configured pay address
const GENESIS_SCRIPT: [u8; 1] = [0x51];

/// Block reward at `height`, halving every [`SUBSIDY_HALVING_INTERVAL`] blocks
pub fn block_subsidy(height: u64) -> u64 {
    let halvings = height / SUBSIDY_HALVING_INTERVAL;
    if halvings >= 64 {
        return 0;
    }
    (INITIAL_BLOCK_REWARD * COIN) >> halvings
}

/// Deterministic genesis block for `params`: no parent, no beat, easiest bits
pub fn genesis_block(params: &Params) -> Block {
    let bits = Target::new(params.pow_limit).to_bits();
    let coinbase = Transaction::new_coinbase(0, 0, GENESIS_SCRIPT.to_vec(), block_subsidy(0));
    let header = Header::new(BLOCK_VERSION, ZERO_HASH, ZERO_HASH, ZERO_HASH, params.genesis_time, bits, 0);
    let mut block = Block::new(header, vec![coinbase]);
    block.refresh_merkle_root();
    block
}

pub struct LocalNode {
    difficulty: DifficultyManager,
    beats: Arc<dyn BeatSource>,
    script_public_key: Vec<u8>,
    genesis: BlockIndex,
    chain: RwLock<Vec<BlockIndex>>,
    /// Parent the extra nonce was last counted against
    extra_nonce_parent: Mutex<Hash>,
}

impl LocalNode {
    pub fn new(params: Params, beats: Arc<dyn BeatSource>, script_public_key: Vec<u8>) -> Self {
        let genesis_block = genesis_block(&params);
        let genesis = BlockIndex {
            height: 0,
            hash: genesis_block.hash(),
            time: genesis_block.header.block_time(),
            bits: genesis_block.header.bits,
            beat_hash: ZERO_HASH,
        };
        info!("Local chain initialized at genesis {}", genesis.hash);

        Self {
            difficulty: DifficultyManager::new(params),
            beats,
            script_public_key,
            chain: RwLock::new(vec![genesis.clone()]),
            genesis,
            extra_nonce_parent: Mutex::new(ZERO_HASH),
        }
    }

    pub fn params(&self) -> &Params {
        self.difficulty.params()
    }

    pub fn height(&self) -> u64 {
        self.tip().height
    }

    /// Snapshot of the confirmed chain, genesis first
    pub fn history(&self) -> Vec<BlockIndex> {
        self.chain.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn tip_index(&self) -> BlockIndex {
        let chain = self.chain.read().unwrap_or_else(|e| e.into_inner());
        chain.last().cloned().unwrap_or_else(|| self.genesis.clone())
    }
}

impl ChainView for LocalNode {
    fn tip(&self) -> ChainTip {
        let tip = self.tip_index();
        ChainTip { hash: tip.hash, height: tip.height, time: tip.time, beat_hash: tip.beat_hash }
    }

    fn adjusted_time(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
    }

    /// A standalone node is its own network
    fn peer_count(&self) -> usize {
        1
    }

    fn work_required_at(&self, time: i64) -> Option<u32> {
        self.difficulty.relaxed_bits(&self.tip_index(), time)
    }
}

impl BlockAssembler for LocalNode {
    fn create_block_template(&self, beat_hash: &Hash) -> Result<Block, MiningError> {
        let history = self.history();
        let tip = history.last().ok_or(RetargetError::EmptyHistory)?;
        let height = tip.height + 1;

        let time = self.adjusted_time().max(tip.time + 1);
        let bits = self.difficulty.next_work_required(&history, time, self.beats.as_ref())?;
        let time = u32::try_from(time).map_err(|_| ConsensusError::InvalidTimestamp)?;

        let coinbase = Transaction::new_coinbase(height, 0, self.script_public_key.clone(), block_subsidy(height));
        let header = Header::new(BLOCK_VERSION, tip.hash, ZERO_HASH, *beat_hash, time, bits, 0);
        let mut block = Block::new(header, vec![coinbase]);
        block.refresh_merkle_root();
        Ok(block)
    }

    fn increment_extra_nonce(&self, block: &mut Block, extra_nonce: &mut u32) -> Result<(), MiningError> {
        {
            let mut parent = self.extra_nonce_parent.lock().unwrap_or_else(|e| e.into_inner());
            if *parent != block.header.prev_block_hash {
                *extra_nonce = 0;
                *parent = block.header.prev_block_hash;
            }
        }
        *extra_nonce = extra_nonce.wrapping_add(1);

        let coinbase = block
            .transactions
            .first_mut()
            .filter(|tx| tx.is_coinbase())
            .ok_or(ConsensusError::InvalidCoinbaseTransaction)?;
        let height = coinbase.coinbase_height().ok_or(ConsensusError::InvalidCoinbaseTransaction)?;
        coinbase.coinbase_script = Some(Transaction::coinbase_script(height, *extra_nonce));

        block.refresh_merkle_root();
        Ok(())
    }

    fn submit_block(&self, block: &Block) -> Result<bool, MiningError> {
        let history = self.history();
        let tip = history.last().ok_or(RetargetError::EmptyHistory)?;
        let hash = block.hash();

        if block.header.prev_block_hash != tip.hash {
            warn!("Rejected block {}: parent {} is not the tip {}", hash, block.header.prev_block_hash, tip.hash);
            return Ok(false);
        }

        block.check_structure()?;

        let bits = self.difficulty.next_work_required(&history, block.header.block_time(), self.beats.as_ref())?;
        if block.header.bits != bits {
            warn!("Rejected block {}: bits {:#010x}, required {:#010x}", hash, block.header.bits, bits);
            return Ok(false);
        }

        if !ProofOfWork::check_proof_of_work(&hash, bits, self.params().pow_limit) {
            warn!("Rejected block {}: proof of work does not meet {:#010x}", hash, bits);
            return Ok(false);
        }

        let beat = block.header.metronome_hash;
        if beat.is_zero() || self.beats.fetch_beat(&beat)?.is_none() {
            warn!("Rejected block {}: unknown beat {}", hash, beat);
            return Ok(false);
        }

        let index = BlockIndex { height: tip.height + 1, hash, time: block.header.block_time(), bits, beat_hash: beat };

        let mut chain = self.chain.write().unwrap_or_else(|e| e.into_inner());
        if chain.last().map(|last| last.hash) != Some(tip.hash) {
            warn!("Rejected block {}: tip moved during validation", hash);
            return Ok(false);
        }
        chain.push(index);

        info!("Connected block {} at height {}", hash, tip.height + 1);
        Ok(true)
    }
}
