// src/merkle/tree.rs
//! Payout Merkle tree construction
//!
//! Leaves keep the order they were supplied in. Each level is paired
//! left to right; a level with an odd number of nodes is padded on the
//! right with a single nil sentinel first. A single leaf is still paired
//! with nil, so every tree has at least one internal node.

use std::collections::HashMap;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::TreeConfig;
use crate::error::{PayoutTreeError, PayoutTreeResult};
use crate::merkle::hash::{HashFunction, MerkleHash};
use crate::merkle::leaf::{PayoutLeafData, WalletAddress};
use crate::merkle::node::MerkleNode;

/// Immutable Merkle tree over one payout snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Root node, always internal
    root: MerkleNode,

    /// Hash function used for every node
    hash_fn: HashFunction,

    /// Leaf payloads in input order
    leaves: Vec<PayoutLeafData>,

    /// First leaf index of each address
    index_by_address: HashMap<WalletAddress, usize>,
}

impl MerkleTree {
    /// Build a tree from ordered leaves with the given hash function
    pub fn new(leaves: Vec<PayoutLeafData>, hash_fn: HashFunction) -> PayoutTreeResult<Self> {
        Self::with_config(leaves, &TreeConfig::with_hash_fn(hash_fn))
    }

    /// Build a tree from ordered leaves
    pub fn with_config(leaves: Vec<PayoutLeafData>, config: &TreeConfig) -> PayoutTreeResult<Self> {
        if leaves.is_empty() {
            return Err(PayoutTreeError::EmptyTree);
        }

        let hash_fn = config.hash_fn;
        let threshold = config.parallel_threshold;

        let mut current_level: Vec<MerkleNode> = if leaves.len() >= threshold {
            leaves.par_iter().map(|data| MerkleNode::leaf(*data, hash_fn)).collect()
        } else {
            leaves.iter().map(|data| MerkleNode::leaf(*data, hash_fn)).collect()
        };

        let mut round = 0;
        loop {
            round += 1;

            // Pad odd levels with the nil sentinel
            if current_level.len() % 2 == 1 {
                current_level.push(MerkleNode::Nil);
            }

            debug!("Pairing round {}: {} nodes", round, current_level.len());
            current_level = pair_level(current_level, round, hash_fn, threshold);

            if current_level.len() == 1 {
                break;
            }
        }

        let root = current_level
            .pop()
            .ok_or_else(|| PayoutTreeError::MalformedTree("no root produced".to_string()))?;

        let mut index_by_address = HashMap::with_capacity(leaves.len());
        for (index, leaf) in leaves.iter().enumerate() {
            index_by_address.entry(leaf.address).or_insert(index);
        }

        info!(
            "Built payout Merkle tree: leaves={}, depth={}, hash_fn={}, root={}",
            leaves.len(),
            root.depth(),
            hash_fn,
            root.hash()
        );

        Ok(Self {
            root,
            hash_fn,
            leaves,
            index_by_address,
        })
    }

    /// Rebuild a tree from persisted leaves and check it against the
    /// root that was stored for them
    pub fn rebuild_checked(
        leaves: Vec<PayoutLeafData>,
        hash_fn: HashFunction,
        expected_root: &MerkleHash,
    ) -> PayoutTreeResult<Self> {
        let tree = Self::new(leaves, hash_fn)?;
        let actual = tree.root_hash();

        if &actual != expected_root {
            return Err(PayoutTreeError::RootMismatch {
                expected: expected_root.to_hex(),
                actual: actual.to_hex(),
            });
        }

        Ok(tree)
    }

    /// Root node
    pub fn root(&self) -> &MerkleNode {
        &self.root
    }

    /// Root hash, the commitment to the whole snapshot
    pub fn root_hash(&self) -> MerkleHash {
        self.root.hash()
    }

    /// Number of pairing rounds
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn hash_fn(&self) -> HashFunction {
        self.hash_fn
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf payload at an input position
    pub fn leaf(&self, index: usize) -> Option<&PayoutLeafData> {
        self.leaves.get(index)
    }

    /// Leaf payloads with their indices, in input order
    pub fn leaves(&self) -> impl Iterator<Item = (usize, &PayoutLeafData)> {
        self.leaves.iter().enumerate()
    }

    /// First leaf for `address`. Duplicate addresses are separate
    /// entitlements; only the first one is found here.
    pub fn leaf_by_address(&self, address: &WalletAddress) -> Option<(usize, &PayoutLeafData)> {
        let index = *self.index_by_address.get(address)?;
        self.leaves.get(index).map(|leaf| (index, leaf))
    }

    pub fn contains_address(&self, address: &WalletAddress) -> bool {
        self.index_by_address.contains_key(address)
    }

    /// Index of the first leaf equal to `data`
    pub fn index_of(&self, data: &PayoutLeafData) -> Option<usize> {
        self.leaves.iter().position(|leaf| leaf == data)
    }
}

/// Join consecutive pairs of an even-sized level into parents
fn pair_level(
    level: Vec<MerkleNode>,
    round: usize,
    hash_fn: HashFunction,
    threshold: usize,
) -> Vec<MerkleNode> {
    let mut pairs = Vec::with_capacity(level.len() / 2);
    let mut nodes = level.into_iter();
    while let (Some(left), Some(right)) = (nodes.next(), nodes.next()) {
        pairs.push((left, right));
    }

    if pairs.len() >= threshold {
        pairs
            .into_par_iter()
            .map(|(left, right)| MerkleNode::internal(left, right, round, hash_fn))
            .collect()
    } else {
        pairs
            .into_iter()
            .map(|(left, right)| MerkleNode::internal(left, right, round, hash_fn))
            .collect()
    }
}
