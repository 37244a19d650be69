//!
//! # Transaction
//!
//! Transactions are opaque to the miner except for the coinbase, whose
//! script carries the block height and the extra nonce.
//!

use crypto_hashes::HashWriter;
use serde::{Deserialize, Serialize};

use crate::Hash;

/// COINBASE_TRANSACTION_INDEX is the index of the coinbase transaction in every block
pub const COINBASE_TRANSACTION_INDEX: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    pub value: u64,
    pub script_public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub version: i32,
    /// Present only on coinbase transactions
    pub coinbase_script: Option<Vec<u8>>,
    pub outputs: Vec<TxOutput>,
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Builds a coinbase paying `value` to `script_public_key`
    pub fn new_coinbase(height: u64, extra_nonce: u32, script_public_key: Vec<u8>, value: u64) -> Self {
        Self {
            version: 1,
            coinbase_script: Some(Self::coinbase_script(height, extra_nonce)),
            outputs: vec![TxOutput { value, script_public_key }],
            payload: Vec::new(),
        }
    }

    /// Coinbase script: height followed by the extra nonce, both little-endian
    pub fn coinbase_script(height: u64, extra_nonce: u32) -> Vec<u8> {
        let mut script = Vec::with_capacity(12);
        script.extend_from_slice(&height.to_le_bytes());
        script.extend_from_slice(&extra_nonce.to_le_bytes());
        script
    }

    pub fn is_coinbase(&self) -> bool {
        self.coinbase_script.is_some()
    }

    /// Block height carried by a coinbase script
    pub fn coinbase_height(&self) -> Option<u64> {
        let script = self.coinbase_script.as_ref()?;
        let bytes: [u8; 8] = script.get(..8)?.try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    /// Extra nonce carried by a coinbase script
    pub fn extra_nonce(&self) -> Option<u32> {
        let script = self.coinbase_script.as_ref()?;
        let bytes: [u8; 4] = script.get(8..12)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    pub fn hash(&self) -> Hash {
        let mut writer = HashWriter::new();
        writer.update(&self.version.to_le_bytes());
        match &self.coinbase_script {
            Some(script) => {
                writer.update(&[1]);
                writer.update(&(script.len() as u64).to_le_bytes());
                writer.update(script);
            }
            None => writer.update(&[0]),
        }
        writer.update(&(self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            writer.update(&output.value.to_le_bytes());
            writer.update(&(output.script_public_key.len() as u64).to_le_bytes());
            writer.update(&output.script_public_key);
        }
        writer.update(&(self.payload.len() as u64).to_le_bytes());
        writer.update(&self.payload);
        Hash::from(writer.finalize_double())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coinbase_carries_extra_nonce() {
        let tx = Transaction::new_coinbase(10, 42, b"miner".to_vec(), 50);
        assert!(tx.is_coinbase());
        assert_eq!(tx.extra_nonce(), Some(42));
        assert_eq!(tx.coinbase_height(), Some(10));
    }

    #[test]
    fn test_extra_nonce_changes_hash() {
        let a = Transaction::new_coinbase(10, 1, b"miner".to_vec(), 50);
        let b = Transaction::new_coinbase(10, 2, b"miner".to_vec(), 50);
        assert_ne!(a.hash(), b.hash());
    }
}
