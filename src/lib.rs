// src/lib.rs
//! Payout Merkle tree snapshots
//!
//! Commits a list of payout entitlements (wallet address and balance) to a
//! single Merkle root, and produces inclusion proofs that smart contracts
//! can verify by recomputing the root:
//! - Keccak-256 (default), SHA-256 and identity hashing
//! - ABI-compatible leaf encoding
//! - Per-leaf inclusion proofs
//! - Canonical JSON for trees and proofs

pub mod config;
pub mod error;
pub mod merkle;

pub use config::TreeConfig;
pub use error::{PayoutTreeError, PayoutTreeResult};
pub use merkle::{
    Balance, HashFunction, MerkleHash, MerkleHasher, MerkleNode, MerkleTree, PathSegment,
    PayoutLeafData, Proof, WalletAddress,
};

/// Build a tree for a payout snapshot with the configured hash function
pub fn build_snapshot_tree(
    leaves: Vec<PayoutLeafData>,
    config: &TreeConfig,
) -> PayoutTreeResult<MerkleTree> {
    MerkleTree::with_config(leaves, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_snapshot_tree_uses_config() {
        let leaves = vec![
            PayoutLeafData::parse("0x1", "100").unwrap(),
            PayoutLeafData::parse("0x2", "200").unwrap(),
        ];
        let config = TreeConfig::with_hash_fn(HashFunction::Sha256);

        let tree = build_snapshot_tree(leaves, &config).unwrap();
        assert_eq!(tree.hash_fn(), HashFunction::Sha256);
        assert_eq!(tree.leaf_count(), 2);
    }
}
