//! Mining manager that coordinates one round of parallel nonce search
//!
//! Each call to [`MiningManager::mine`] partitions the nonce space, spawns a
//! fresh worker thread per range, and joins them all before returning.

use crate::job::{partition_nonce_space, MinedBlock, MiningJob};
use crate::node::ChainView;
use crate::session::{Interrupt, MiningSession};
use crate::worker::{MinerWorker, WorkerOutcome, WorkerStats};
use consensus_core::block::Block;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

/// Configuration for the mining manager
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Number of worker threads
    pub num_workers: usize,
    /// Nonces between header timestamp refreshes
    pub timestamp_refresh_interval: u64,
    /// Nonces between hash-rate reports
    pub hash_rate_interval: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self { num_workers: num_cpus::get(), timestamp_refresh_interval: 10, hash_rate_interval: 100_000 }
    }
}

/// Result of one mining round
#[derive(Clone, Debug)]
pub struct MiningResult {
    pub job_id: u64,
    /// The winning block, if any worker claimed one
    pub winner: Option<MinedBlock>,
    /// Outcome per worker, indexed by worker id
    pub outcomes: Vec<WorkerOutcome>,
    pub total_hashes: u64,
    pub time_ms: u64,
    pub hash_rate: f64,
}

impl MiningResult {
    pub fn is_found(&self) -> bool {
        self.winner.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.outcomes.contains(&WorkerOutcome::Stale)
    }
}

/// Coordinates mining rounds across a fixed-size worker pool
pub struct MiningManager {
    config: MiningConfig,
    /// Process-wide shutdown signal
    interrupt: Interrupt,
    /// Worker statistics
    worker_stats: Mutex<Vec<WorkerStats>>,
    rounds: Mutex<u64>,
    /// Start time of the mining session
    session_start: Instant,
}

impl MiningManager {
    /// Creates a new mining manager
    pub fn new(config: MiningConfig, interrupt: Interrupt) -> Self {
        let workers = config.num_workers.max(1);
        Self {
            config: MiningConfig { num_workers: workers, ..config },
            interrupt,
            worker_stats: Mutex::new(vec![WorkerStats::default(); workers]),
            rounds: Mutex::new(0),
            session_start: Instant::now(),
        }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Returns the number of workers spawned per round
    pub fn worker_count(&self) -> usize {
        self.config.num_workers
    }

    /// Search for a solution to `block`, blocking until every worker has exited
    pub fn mine(&self, block: Block, chain: Arc<dyn ChainView>) -> MiningResult {
        let job = Arc::new(MiningJob::new(block));
        let session = Arc::new(MiningSession::new(self.config.num_workers, self.interrupt.clone()));
        let ranges = partition_nonce_space(self.config.num_workers);

        log::info!(
            "Mining job {} on parent {} with bits {:#010x} across {} workers",
            job.job_id,
            job.parent_hash(),
            job.bits(),
            ranges.len()
        );

        let mut handles = Vec::with_capacity(ranges.len());
        for (worker_id, range) in ranges.into_iter().enumerate() {
            let worker = MinerWorker::new(worker_id, range, Arc::clone(&job), Arc::clone(&session), Arc::clone(&chain))
                .with_intervals(self.config.timestamp_refresh_interval, self.config.hash_rate_interval);

            match thread::Builder::new().name(format!("miner-{}", worker_id)).spawn(move || worker.run()) {
                Ok(handle) => handles.push((worker_id, handle)),
                Err(e) => log::error!("Failed to spawn worker {}: {}", worker_id, e),
            }
        }

        let mut outcomes = vec![WorkerOutcome::Cancelled; self.config.num_workers];
        for (worker_id, handle) in handles {
            match handle.join() {
                Ok(outcome) => outcomes[worker_id] = outcome,
                Err(e) => log::error!("Worker thread {} panicked: {:?}", worker_id, e),
            }
        }

        let time_ms = session.elapsed_ms();
        let winner = session.take_winner();
        let progress = session.progress();
        self.record_round(&progress, time_ms, winner.as_ref().map(|w| w.worker_id));

        let result = MiningResult {
            job_id: job.job_id,
            winner,
            outcomes,
            total_hashes: progress.iter().sum(),
            time_ms,
            hash_rate: session.update_hash_rate(),
        };

        log::debug!("Job {} finished after {}ms: {:?}", result.job_id, job.age_ms(), result.outcomes);
        result
    }

    fn record_round(&self, progress: &[u64], time_ms: u64, winner: Option<usize>) {
        let mut stats = self.worker_stats.lock().unwrap_or_else(|e| e.into_inner());
        for (worker_id, (stat, tried)) in stats.iter_mut().zip(progress).enumerate() {
            stat.record_round(*tried, time_ms, winner == Some(worker_id));
        }
        *self.rounds.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    /// Gets the current statistics for all workers
    pub fn get_worker_stats(&self) -> Vec<WorkerStats> {
        self.worker_stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Gets overall mining session statistics
    pub fn get_session_stats(&self) -> SessionStats {
        let stats = self.get_worker_stats();
        let session_duration_ms = self.session_start.elapsed().as_millis() as u64;

        let total_blocks = stats.iter().map(|s| s.blocks_mined).sum();
        let total_iterations = stats.iter().map(|s| s.total_iterations).sum();

        let overall_hash_rate = if session_duration_ms > 0 {
            (total_iterations as f64) / (session_duration_ms as f64 / 1000.0)
        } else {
            0.0
        };

        SessionStats {
            session_duration_ms,
            rounds: *self.rounds.lock().unwrap_or_else(|e| e.into_inner()),
            total_blocks,
            total_iterations,
            overall_hash_rate,
            worker_count: self.config.num_workers,
            worker_stats: stats,
        }
    }
}

/// Statistics for a mining session
#[derive(Clone, Debug)]
pub struct SessionStats {
    pub session_duration_ms: u64,
    pub rounds: u64,
    pub total_blocks: u64,
    pub total_iterations: u64,
    pub overall_hash_rate: f64,
    pub worker_count: usize,
    pub worker_stats: Vec<WorkerStats>,
}

impl SessionStats {
    /// Formats session stats as a readable string
    pub fn format_summary(&self) -> String {
        format!(
            "Mining Session Stats:\n  Duration: {}ms\n  Rounds: {}\n  Total Blocks: {}\n  Total Iterations: {}\n  \
             Workers: {}\n  Overall Hash Rate: {:.2} MH/s",
            self.session_duration_ms,
            self.rounds,
            self.total_blocks,
            self.total_iterations,
            self.worker_count,
            self.overall_hash_rate / 1_000_000.0
        )
    }
}
