//! Per-round shared state and the process-wide interrupt

use crate::job::MinedBlock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Process-wide cancellation flag. Set once at shutdown, never cleared.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep up to `duration`, waking early on interrupt.
    /// Returns true if interrupted.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// State shared by the workers of one mining round.
///
/// The first worker to win the compare-and-set on `found` owns the result;
/// later finders see the flag already set and give up their candidate.
#[derive(Debug)]
pub struct MiningSession {
    interrupt: Interrupt,
    found: AtomicBool,
    winner: Mutex<Option<MinedBlock>>,
    progress: Vec<AtomicU64>,
    started: Instant,
    hash_rate: AtomicU64,
}

impl MiningSession {
    pub fn new(workers: usize, interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            found: AtomicBool::new(false),
            winner: Mutex::new(None),
            progress: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            started: Instant::now(),
            hash_rate: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_triggered()
    }

    /// Store `block` as the round's result if no other worker got there first
    pub fn claim(&self, block: MinedBlock) -> bool {
        if self.found.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return false;
        }
        *self.winner.lock().unwrap_or_else(|e| e.into_inner()) = Some(block);
        true
    }

    pub fn take_winner(&self) -> Option<MinedBlock> {
        self.winner.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Publish how many nonces `worker` has tried so far
    pub fn record_progress(&self, worker: usize, tried: u64) {
        if let Some(counter) = self.progress.get(worker) {
            counter.store(tried, Ordering::Relaxed);
        }
    }

    pub fn progress(&self) -> Vec<u64> {
        self.progress.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    pub fn total_hashes(&self) -> u64 {
        self.progress.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Recompute the aggregate hash rate from all progress counters
    pub fn update_hash_rate(&self) -> f64 {
        let rate = crate::pow::ProofOfWork::calculate_hash_rate(self.total_hashes(), self.elapsed_ms());
        self.hash_rate.store(rate.to_bits(), Ordering::Relaxed);
        rate
    }

    pub fn hash_rate(&self) -> f64 {
        f64::from_bits(self.hash_rate.load(Ordering::Relaxed))
    }
}
