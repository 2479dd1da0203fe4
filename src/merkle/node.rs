// src/merkle/node.rs
//! Merkle tree nodes
//!
//! A node is a leaf carrying one payout entitlement, an internal node
//! joining two children, or the nil sentinel used to pad odd levels.

use crate::error::{PayoutTreeError, PayoutTreeResult};
use crate::merkle::hash::{HashFunction, MerkleHash, MerkleHasher};
use crate::merkle::leaf::PayoutLeafData;

/// Leaf node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub hash: MerkleHash,
    pub data: PayoutLeafData,
}

/// Internal node. `depth` is the pairing round that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    pub hash: MerkleHash,
    pub left: Box<MerkleNode>,
    pub right: Box<MerkleNode>,
    pub depth: usize,
}

/// Node of a payout Merkle tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerkleNode {
    Leaf(LeafNode),
    Internal(InternalNode),
    Nil,
}

impl MerkleNode {
    /// Leaf hashed from the ABI encoding of its payload
    pub(crate) fn leaf(data: PayoutLeafData, hash_fn: HashFunction) -> Self {
        MerkleNode::Leaf(LeafNode {
            hash: hash_fn.hash(&data.abi_encode()),
            data,
        })
    }

    /// Parent of `left` and `right`, produced in pairing round `depth`.
    /// Both children must have been built with `hash_fn`.
    pub(crate) fn internal(left: MerkleNode, right: MerkleNode, depth: usize, hash_fn: HashFunction) -> Self {
        let hash = hash_fn.hash_pair(&left.hash(), &right.hash());
        MerkleNode::Internal(InternalNode {
            hash,
            left: Box::new(left),
            right: Box::new(right),
            depth,
        })
    }

    /// Hash of this node. Nil always yields the fixed sentinel.
    pub fn hash(&self) -> MerkleHash {
        match self {
            MerkleNode::Leaf(leaf) => leaf.hash.clone(),
            MerkleNode::Internal(node) => node.hash.clone(),
            MerkleNode::Nil => MerkleHash::nil(),
        }
    }

    /// Number of pairing rounds below this node
    pub fn depth(&self) -> usize {
        match self {
            MerkleNode::Internal(node) => node.depth,
            MerkleNode::Leaf(_) | MerkleNode::Nil => 0,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, MerkleNode::Nil)
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            MerkleNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_internal(&self) -> Option<&InternalNode> {
        match self {
            MerkleNode::Internal(node) => Some(node),
            _ => None,
        }
    }

    /// Append the payloads of all leaves under this node, left to right
    pub fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a PayoutLeafData>) {
        match self {
            MerkleNode::Leaf(leaf) => out.push(&leaf.data),
            MerkleNode::Internal(node) => {
                node.left.collect_leaves(out);
                node.right.collect_leaves(out);
            }
            MerkleNode::Nil => {}
        }
    }

    /// Recompute every hash in this subtree with `hash_fn` and compare it
    /// against the stored one. Returns the recomputed hash of this node.
    pub fn verify(&self, hash_fn: HashFunction) -> PayoutTreeResult<MerkleHash> {
        let (stored, computed) = match self {
            MerkleNode::Leaf(leaf) => (leaf.hash.clone(), hash_fn.hash(&leaf.data.abi_encode())),
            MerkleNode::Internal(node) => {
                let left = node.left.verify(hash_fn)?;
                let right = node.right.verify(hash_fn)?;
                (node.hash.clone(), hash_fn.hash_pair(&left, &right))
            }
            MerkleNode::Nil => return Ok(MerkleHash::nil()),
        };

        if stored != computed {
            return Err(PayoutTreeError::HashMismatch {
                expected: stored.to_hex(),
                actual: computed.to_hex(),
            });
        }

        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_data(address: &str, balance: &str) -> PayoutLeafData {
        PayoutLeafData::parse(address, balance).unwrap()
    }

    #[test]
    fn test_leaf_hash_is_hashed_encoding() {
        let data = leaf_data("0x5", "10");
        let node = MerkleNode::leaf(data, HashFunction::Keccak256);
        assert_eq!(node.hash(), HashFunction::Keccak256.hash(&data.abi_encode()));
        assert_eq!(node.depth(), 0);
        assert_eq!(node.as_leaf().unwrap().data, data);
    }

    #[test]
    fn test_internal_hash_concatenates_children() {
        let left = MerkleNode::leaf(leaf_data("0x1", "1"), HashFunction::Identity);
        let right = MerkleNode::Nil;
        let expected = [left.hash().as_bytes(), MerkleHash::nil().as_bytes()].concat();

        let node = MerkleNode::internal(left, right, 1, HashFunction::Identity);
        assert_eq!(node.hash().as_bytes(), expected.as_slice());
        assert_eq!(node.depth(), 1);
        assert!(node.as_internal().unwrap().right.is_nil());
    }

    #[test]
    fn test_nil_hash_ignores_hash_function() {
        assert_eq!(MerkleNode::Nil.hash(), MerkleHash::nil());
        assert_eq!(MerkleNode::Nil.verify(HashFunction::Keccak256).unwrap(), MerkleHash::nil());
    }

    #[test]
    fn test_verify_detects_tampered_leaf() {
        let left = MerkleNode::leaf(leaf_data("0x1", "1"), HashFunction::Keccak256);
        let right = MerkleNode::leaf(leaf_data("0x2", "2"), HashFunction::Keccak256);
        let mut node = MerkleNode::internal(left, right, 1, HashFunction::Keccak256);
        assert!(node.verify(HashFunction::Keccak256).is_ok());

        if let MerkleNode::Internal(inner) = &mut node {
            if let MerkleNode::Leaf(leaf) = inner.left.as_mut() {
                leaf.data.balance = 1000u64.into();
            }
        }
        assert!(matches!(
            node.verify(HashFunction::Keccak256),
            Err(PayoutTreeError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_detects_wrong_hash_function() {
        let left = MerkleNode::leaf(leaf_data("0x1", "1"), HashFunction::Sha256);
        let node = MerkleNode::internal(left, MerkleNode::Nil, 1, HashFunction::Sha256);
        assert!(node.verify(HashFunction::Keccak256).is_err());
    }

    #[test]
    fn test_mixed_hash_functions_never_verify() {
        let data = leaf_data("0xa", "5");
        let left = MerkleNode::leaf(data, HashFunction::Sha256);
        let right = MerkleNode::leaf(data, HashFunction::Keccak256);
        let node = MerkleNode::internal(left, right, 1, HashFunction::Identity);

        for hash_fn in [HashFunction::Identity, HashFunction::Keccak256, HashFunction::Sha256] {
            assert!(matches!(
                node.verify(hash_fn),
                Err(PayoutTreeError::HashMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_collect_leaves_in_order() {
        let a = leaf_data("0x1", "1");
        let b = leaf_data("0x2", "2");
        let c = leaf_data("0x3", "3");
        let hash_fn = HashFunction::Keccak256;
        let ab = MerkleNode::internal(MerkleNode::leaf(a, hash_fn), MerkleNode::leaf(b, hash_fn), 1, hash_fn);
        let cn = MerkleNode::internal(MerkleNode::leaf(c, hash_fn), MerkleNode::Nil, 1, hash_fn);
        let root = MerkleNode::internal(ab, cn, 2, hash_fn);

        let mut leaves = Vec::new();
        root.collect_leaves(&mut leaves);
        assert_eq!(leaves, vec![&a, &b, &c]);
    }
}
