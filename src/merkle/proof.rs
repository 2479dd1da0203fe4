// src/merkle/proof.rs
//! Inclusion proofs
//!
//! A proof lists, from the leaf level up to just below the root, the hash
//! of the sibling at each level and whether the node on the path was the
//! left child. Recombining the claimed leaf hash with those siblings must
//! reproduce the published root.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::{PayoutTreeError, PayoutTreeResult};
use crate::merkle::hash::{HashFunction, MerkleHash, MerkleHasher};
use crate::merkle::leaf::{PayoutLeafData, WalletAddress};
use crate::merkle::node::MerkleNode;
use crate::merkle::tree::MerkleTree;

/// One level of an inclusion proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PathSegment {
    /// Hash of the sibling at this level
    pub sibling_hash: MerkleHash,

    /// Whether the node on the path (not the sibling) is the left child
    pub is_left: bool,
}

impl PathSegment {
    pub fn new(sibling_hash: MerkleHash, is_left: bool) -> Self {
        Self { sibling_hash, is_left }
    }
}

/// Inclusion proof, ordered from the leaf level upward
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(transparent)]
pub struct Proof {
    segments: Vec<PathSegment>,
}

impl Proof {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Fold the proof over `leaf_hash` and return the resulting root
    pub fn compute_root(&self, leaf_hash: &MerkleHash, hash_fn: HashFunction) -> MerkleHash {
        self.segments.iter().fold(leaf_hash.clone(), |current, segment| {
            if segment.is_left {
                hash_fn.hash_pair(&current, &segment.sibling_hash)
            } else {
                hash_fn.hash_pair(&segment.sibling_hash, &current)
            }
        })
    }

    /// Check that `claimed` is included under `root`.
    ///
    /// `hash_fn` must be the function the tree was built with. Any other
    /// function yields a different root, so verification returns false
    /// rather than an error.
    pub fn verify(&self, claimed: &PayoutLeafData, root: &MerkleHash, hash_fn: HashFunction) -> bool {
        let leaf_hash = hash_fn.hash(&claimed.abi_encode());
        &self.compute_root(&leaf_hash, hash_fn) == root
    }

    /// Compact binary form
    pub fn to_bytes(&self) -> PayoutTreeResult<Vec<u8>> {
        Ok(self.try_to_vec()?)
    }

    pub fn from_bytes(bytes: &[u8]) -> PayoutTreeResult<Self> {
        Ok(Self::try_from_slice(bytes)?)
    }
}

impl MerkleTree {
    /// Proof of inclusion for the leaf at `leaf_index`
    pub fn prove_inclusion(&self, leaf_index: usize) -> PayoutTreeResult<Proof> {
        let leaf_count = self.leaf_count();
        if leaf_index >= leaf_count {
            return Err(PayoutTreeError::IndexOutOfRange {
                index: leaf_index,
                leaf_count,
            });
        }

        // Bit `level` of the index selects the child at that level.
        // Walk down from the root, then reverse into leaf-to-root order.
        let mut segments = Vec::with_capacity(self.depth());
        let mut current = self.root();

        for level in (0..self.depth()).rev() {
            let node = current.as_internal().ok_or_else(|| {
                PayoutTreeError::MalformedTree(format!(
                    "expected internal node above level {} on the path to leaf {}",
                    level, leaf_index
                ))
            })?;

            let is_left = (leaf_index >> level) & 1 == 0;
            let (next, sibling) = if is_left {
                (node.left.as_ref(), node.right.as_ref())
            } else {
                (node.right.as_ref(), node.left.as_ref())
            };

            segments.push(PathSegment::new(sibling.hash(), is_left));
            current = next;
        }

        if !matches!(current, MerkleNode::Leaf(_)) {
            return Err(PayoutTreeError::MalformedTree(format!(
                "path to leaf {} does not end at a leaf",
                leaf_index
            )));
        }

        segments.reverse();
        Ok(Proof::new(segments))
    }

    /// Proof for the first leaf equal to `data`, or `None` when the
    /// payload is not part of this snapshot
    pub fn path_to(&self, data: &PayoutLeafData) -> Option<Proof> {
        let index = self.index_of(data)?;
        self.prove_inclusion(index).ok()
    }

    /// Entitlement and proof for the first leaf of `address`
    pub fn path_for_address(&self, address: &WalletAddress) -> Option<(PayoutLeafData, Proof)> {
        let (index, data) = self.leaf_by_address(address)?;
        let data = *data;
        self.prove_inclusion(index).ok().map(|proof| (data, proof))
    }

    /// Verify a proof against this tree's root and hash function
    pub fn verify_proof(&self, claimed: &PayoutLeafData, proof: &Proof) -> bool {
        proof.verify(claimed, &self.root_hash(), self.hash_fn())
    }
}
