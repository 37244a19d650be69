//! Mining job definitions and nonce-space partitioning
//!
//! A [`MiningJob`] carries the block candidate every worker starts from; each
//! worker owns one [`NonceRange`] of the 32-bit nonce space.

use crate::pow::Target;
use consensus_core::block::Block;
use consensus_core::Hash;
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of the header nonce space, `2^32`
pub const NONCE_SPACE: u64 = 1 << 32;

/// Represents a mining job that workers process
#[derive(Clone, Debug)]
pub struct MiningJob {
    /// The block candidate to mine
    pub block: Block,
    /// The difficulty target decoded from the block's bits
    pub target: Target,
    /// Timestamp when this job was created
    pub job_timestamp: u64,
    /// Job identifier for tracking
    pub job_id: u64,
}

impl MiningJob {
    pub fn new(block: Block) -> Self {
        let target = Target::from_bits(block.header.bits);
        Self { block, target, job_timestamp: current_timestamp(), job_id: generate_job_id() }
    }

    /// Gets the age of the job in milliseconds
    pub fn age_ms(&self) -> u64 {
        current_timestamp().saturating_sub(self.job_timestamp)
    }

    /// Parent the candidate was built on
    pub fn parent_hash(&self) -> Hash {
        self.block.header.prev_block_hash
    }

    /// Gets the difficulty bits
    pub fn bits(&self) -> u32 {
        self.block.header.bits
    }
}

/// Half-open nonce interval `[start, end)` owned by one worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NonceRange {
    pub start: u64,
    pub end: u64,
}

impl NonceRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, nonce: u64) -> bool {
        nonce >= self.start && nonce < self.end
    }
}

/// Split `[0, 2^32)` into `workers` contiguous ranges of `2^32 / workers`.
/// The last range also takes the division remainder so nothing is skipped.
pub fn partition_nonce_space(workers: usize) -> Vec<NonceRange> {
    let workers = workers.max(1) as u64;
    let page = NONCE_SPACE / workers;

    (0..workers)
        .map(|i| NonceRange {
            start: i * page,
            end: if i + 1 == workers { NONCE_SPACE } else { (i + 1) * page },
        })
        .collect()
}

/// Mined block result that workers send back
#[derive(Clone, Debug)]
pub struct MinedBlock {
    /// The job that produced this block
    pub job_id: u64,
    /// The worker ID that mined this block
    pub worker_id: usize,
    /// The solved block
    pub block: Block,
    /// The hash of the mined block
    pub block_hash: Hash,
    /// Number of iterations performed to find this block
    pub iterations: u64,
    /// Time taken to mine in milliseconds
    pub time_ms: u64,
}

impl MinedBlock {
    pub fn nonce(&self) -> u32 {
        self.block.header.nonce
    }

    /// Calculates the hash rate for this mining result
    pub fn hash_rate(&self) -> f64 {
        if self.time_ms == 0 {
            return 0.0;
        }
        (self.iterations as f64) / (self.time_ms as f64 / 1000.0)
    }
}

/// Gets the current timestamp in milliseconds since UNIX_EPOCH
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Generates a unique job ID
fn generate_job_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}
