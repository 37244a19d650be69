use crate::{hasher::HashWriter, Hash};

/// Merkle tree over transaction hashes, Bitcoin style (double SHA256, odd node duplicated)
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Create a Merkle tree directly from leaf hashes
    pub fn from_leaves(leaves: Vec<Hash>) -> Self {
        let mut tree = Self { levels: vec![leaves] };
        tree.build_tree();
        tree
    }

    fn build_tree(&mut self) {
        let mut current_level = self.levels[0].clone();
        while current_level.len() > 1 {
            let next_level: Vec<Hash> = current_level
                .chunks(2)
                .map(|chunk| {
                    let (left, right) = match chunk {
                        [left, right] => (left, right),
                        [single] => (single, single),
                        _ => unreachable!("chunks(2) yields one or two items"),
                    };
                    let mut writer = HashWriter::new();
                    writer.update(left.as_bytes());
                    writer.update(right.as_bytes());
                    Hash::from(writer.finalize_double())
                })
                .collect();
            self.levels.push(next_level.clone());
            current_level = next_level;
        }
    }

    /// Get the Merkle root hash; the zero hash for an empty tree
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }
}
