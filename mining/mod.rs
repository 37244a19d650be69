//! Beat-paced proof-of-work mining
//!
//! This crate implements the mining side of the node: compact-target
//! proof-of-work, difficulty retargeting against metronome beats, and a
//! multithreaded nonce search with cooperative cancellation.
//!
//! ## Module Organization
//!
//! - [`pow`]: Compact targets and proof-of-work checks using double SHA256
//! - [`difficulty`]: Height-dispatched retarget policies
//! - [`job`]: Mining jobs, mined blocks and nonce-space partitioning
//! - [`session`]: Per-round shared flags and the process interrupt
//! - [`worker`]: The per-range search loop
//! - [`manager`]: Runs a round across the worker pool
//! - [`node`]: What the miner needs from the node it serves

pub mod difficulty;
pub mod errors;
pub mod job;
pub mod manager;
pub mod node;
pub mod pow;
pub mod session;
pub mod worker;

#[cfg(test)]
pub mod tests;

// Re-export main types for easier access
pub use difficulty::{BlockIndex, DifficultyManager, RetargetPolicy, RetargetSchedule};
pub use errors::{MiningError, RetargetError};
pub use job::{partition_nonce_space, MinedBlock, MiningJob, NonceRange};
pub use manager::{MiningConfig, MiningManager, MiningResult, SessionStats};
pub use node::{BlockAssembler, ChainTip, ChainView};
pub use pow::{ProofOfWork, Target};
pub use session::{Interrupt, MiningSession};
pub use worker::{MinerWorker, WorkerOutcome, WorkerStats};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::difficulty::{BlockIndex, DifficultyManager};
    pub use crate::errors::{MiningError, RetargetError};
    pub use crate::job::{MinedBlock, MiningJob};
    pub use crate::manager::{MiningConfig, MiningManager, MiningResult};
    pub use crate::node::{BlockAssembler, ChainTip, ChainView};
    pub use crate::pow::{ProofOfWork, Target};
    pub use crate::session::Interrupt;
    pub use crate::worker::WorkerOutcome;
}
