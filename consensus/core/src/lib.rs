//! Consensus data types shared by the miner: headers, blocks, transactions
//! and per-network consensus parameters.

pub mod block;
pub mod config;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod header;
pub mod tx;

pub use crypto_hashes::Hash;

/// The all-zero hash, used for "no parent" and "no beat"
pub const ZERO_HASH: Hash = Hash::zeroed();
