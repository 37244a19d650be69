use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Invalid merkle root")]
    InvalidMerkleRoot,

    #[error("Invalid coinbase transaction")]
    InvalidCoinbaseTransaction,

    #[error("Empty transaction list")]
    EmptyTransactionList,

    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}
