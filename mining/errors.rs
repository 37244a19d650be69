use consensus_core::errors::ConsensusError;
use consensus_core::Hash;
use metronome::MetronomeError;
use thiserror::Error;

/// Failures computing the next required work
#[derive(Error, Debug)]
pub enum RetargetError {
    /// A confirmed block references a beat the metronome cannot resolve
    #[error("no beat {beat} for confirmed block {block} at height {height}")]
    MissingBeat { height: u64, block: Hash, beat: Hash },

    #[error("retarget at height {height} needs block {missing}, which is not in the supplied history")]
    InsufficientHistory { height: u64, missing: u64 },

    #[error("chain history is empty")]
    EmptyHistory,

    #[error(transparent)]
    Metronome(#[from] MetronomeError),
}

impl RetargetError {
    /// Invariant violations that no later round can repair
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RetargetError::Metronome(_))
    }
}

#[derive(Error, Debug)]
pub enum MiningError {
    #[error("metronome error: {0}")]
    Metronome(#[from] MetronomeError),

    #[error("difficulty retarget failed: {0}")]
    Retarget(#[from] RetargetError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("node error: {0}")]
    Node(String),
}

impl MiningError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, MiningError::Retarget(e) if e.is_fatal())
    }
}
