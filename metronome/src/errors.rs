use thiserror::Error;

/// Failures talking to the metronome node
#[derive(Error, Debug)]
pub enum MetronomeError {
    #[error("couldn't connect to metronome server: {0}")]
    Connect(String),

    #[error("incorrect metronome user or password (authorization failed)")]
    Unauthorized,

    #[error("metronome server returned HTTP error {0}")]
    HttpStatus(u16),

    #[error("no response from metronome server")]
    EmptyResponse,

    #[error("couldn't parse reply from metronome server: {0}")]
    InvalidReply(String),

    #[error("invalid metronome endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("metronome call {method} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        method: String,
        attempts: usize,
        last: Box<MetronomeError>,
    },
}

/// Failures reading or writing `metronomes.dat`
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("beat cache is corrupt: {0}")]
    Corrupt(String),

    #[error("cache serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
