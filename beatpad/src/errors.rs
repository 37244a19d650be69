use crate::config::ConfigError;
use metronome::MetronomeError;
use mining::MiningError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metronome error: {0}")]
    Metronome(#[from] MetronomeError),

    #[error("mining error: {0}")]
    Mining(#[from] MiningError),
}
