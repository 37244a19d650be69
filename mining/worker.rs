//! Mining worker thread implementation
//!
//! Each `MinerWorker` searches one nonce range of a job until it finds a
//! solution, runs out of nonces, or is told to stop.

use crate::job::{MinedBlock, MiningJob, NonceRange};
use crate::node::ChainView;
use crate::pow::ProofOfWork;
use crate::session::MiningSession;
use consensus_core::header::Header;
use std::sync::Arc;
use std::time::Instant;

/// How a worker's search ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// This worker's block is the round's result
    Found,
    /// Walked off the end of the assigned range
    Exhausted,
    /// Process interrupt observed
    Cancelled,
    /// Chain tip moved away from the candidate's parent
    Stale,
    /// Another worker claimed the round first
    Superseded,
    /// Solved, but the node had no peers so the block was dropped
    Disconnected,
}

/// A mining worker that searches one nonce range in its own thread
pub struct MinerWorker {
    /// Unique identifier for this worker
    pub id: usize,
    pub range: NonceRange,
    job: Arc<MiningJob>,
    session: Arc<MiningSession>,
    chain: Arc<dyn ChainView>,
    timestamp_refresh_interval: u64,
    hash_rate_interval: u64,
}

impl MinerWorker {
    pub fn new(
        id: usize,
        range: NonceRange,
        job: Arc<MiningJob>,
        session: Arc<MiningSession>,
        chain: Arc<dyn ChainView>,
    ) -> Self {
        Self { id, range, job, session, chain, timestamp_refresh_interval: 10, hash_rate_interval: 100_000 }
    }

    pub fn with_intervals(mut self, timestamp_refresh: u64, hash_rate: u64) -> Self {
        self.timestamp_refresh_interval = timestamp_refresh.max(1);
        self.hash_rate_interval = hash_rate.max(1);
        self
    }

    /// Runs the search loop (blocking, should be run in a thread)
    pub fn run(&self) -> WorkerOutcome {
        let start_time = Instant::now();
        let mut header = self.job.block.header.clone();
        let mut nonce = self.range.start;
        header.nonce = nonce as u32;

        if self.range.is_empty() {
            return WorkerOutcome::Exhausted;
        }

        log::debug!("Worker {} searching nonces [{}, {})", self.id, self.range.start, self.range.end);

        loop {
            let tried = nonce - self.range.start;
            self.session.record_progress(self.id, tried);

            if self.session.is_interrupted() {
                log::debug!("Worker {} interrupted on job {}", self.id, self.job.job_id);
                return WorkerOutcome::Cancelled;
            }
            if self.session.is_found() {
                return WorkerOutcome::Superseded;
            }
            if self.chain.tip_hash() != header.prev_block_hash {
                if self.id == 0 {
                    log::info!("Someone else mined a block, abandoning job {}", self.job.job_id);
                }
                return WorkerOutcome::Stale;
            }

            if ProofOfWork::is_valid_pow(&header) {
                return self.finish(header, tried + 1, start_time);
            }

            nonce += 1;
            if !self.range.contains(nonce) {
                log::debug!("Worker {} exhausted its nonce range", self.id);
                return WorkerOutcome::Exhausted;
            }
            header.nonce = nonce as u32;

            if nonce % self.timestamp_refresh_interval == 0 {
                header.time = u32::try_from(self.chain.adjusted_time()).unwrap_or(header.time);
                if let Some(bits) = self.chain.work_required_at(header.block_time()) {
                    header.bits = bits;
                }
            }

            if self.id == 0 && nonce % self.hash_rate_interval == 0 {
                let rate = self.session.update_hash_rate();
                log::debug!("Nonces: {:?} ({:.2} kH/s)", self.session.progress(), rate / 1000.0);
            }
        }
    }

    fn finish(&self, header: Header, iterations: u64, start_time: Instant) -> WorkerOutcome {
        if self.chain.tip_hash() != header.prev_block_hash {
            return WorkerOutcome::Stale;
        }
        if self.chain.peer_count() == 0 {
            log::warn!(
                "Worker {} solved job {} but the node has no peers; discarding block {}",
                self.id,
                self.job.job_id,
                header.hash()
            );
            return WorkerOutcome::Disconnected;
        }

        let mut block = self.job.block.clone();
        block.header = header;
        let time_ms = start_time.elapsed().as_millis() as u64;
        let mined = MinedBlock {
            job_id: self.job.job_id,
            worker_id: self.id,
            block_hash: block.hash(),
            block,
            iterations,
            time_ms,
        };

        log::info!(
            "Worker {} found block {} for job {} with nonce {} after {} iterations in {}ms (hash rate: {:.2} MH/s)",
            self.id,
            mined.block_hash,
            self.job.job_id,
            mined.nonce(),
            iterations,
            time_ms,
            mined.hash_rate() / 1_000_000.0
        );

        if self.session.claim(mined) {
            WorkerOutcome::Found
        } else {
            WorkerOutcome::Superseded
        }
    }
}

/// Statistics for a mining worker across rounds
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    /// Total blocks mined by this worker
    pub blocks_mined: u64,
    /// Total iterations performed
    pub total_iterations: u64,
    /// Total mining time in milliseconds
    pub total_time_ms: u64,
    /// Average hash rate in hashes per second
    pub average_hash_rate: f64,
}

impl WorkerStats {
    /// Folds one round's work into the totals
    pub fn record_round(&mut self, iterations: u64, time_ms: u64, found: bool) {
        if found {
            self.blocks_mined += 1;
        }
        self.total_iterations += iterations;
        self.total_time_ms += time_ms;

        if self.total_time_ms > 0 {
            self.average_hash_rate = (self.total_iterations as f64) / (self.total_time_ms as f64 / 1000.0);
        }
    }
}
