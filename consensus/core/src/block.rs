use crypto_hashes::MerkleTree;
use serde::{Deserialize, Serialize};

use crate::{errors::ConsensusError, header::Header, tx::Transaction, Hash};

/// Complete block structure including header and transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }

    /// Calculates the merkle root of the block's transactions
    pub fn calculate_merkle_root(&self) -> Hash {
        let tx_hashes: Vec<Hash> = self.transactions.iter().map(|tx| tx.hash()).collect();
        MerkleTree::from_leaves(tx_hashes).root()
    }

    /// Recomputes the header's merkle root after the transaction list changed
    pub fn refresh_merkle_root(&mut self) {
        self.header.merkle_root = self.calculate_merkle_root();
    }

    /// Context-free structure checks: one leading coinbase and a matching merkle root
    pub fn check_structure(&self) -> Result<(), ConsensusError> {
        if self.transactions.is_empty() {
            return Err(ConsensusError::EmptyTransactionList);
        }
        if self.coinbase().is_none() || self.transactions[1..].iter().any(|tx| tx.is_coinbase()) {
            return Err(ConsensusError::InvalidCoinbaseTransaction);
        }
        if self.calculate_merkle_root() != self.header.merkle_root {
            return Err(ConsensusError::InvalidMerkleRoot);
        }
        Ok(())
    }
}
