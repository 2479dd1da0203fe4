// src/merkle/json.rs
//! Canonical JSON form of payout trees
//!
//! The root object carries the tree metadata (`depth`, `hash`, `hash_fn`)
//! followed by its children. Below the root, internal nodes carry `hash`,
//! `left` and `right`; leaves carry `hash` and `data`; nil nodes carry
//! only `hash`.
//!
//! Decoding is strict: every hash is recomputed with the declared hash
//! function and the node layout must be the one the builder produces for
//! the contained leaves.

use log::warn;
use serde::de::Error as DeError;
use serde::ser::{Error as SerError, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PayoutTreeError, PayoutTreeResult};
use crate::merkle::hash::{HashFunction, MerkleHash};
use crate::merkle::leaf::PayoutLeafData;
use crate::merkle::node::{InternalNode, LeafNode, MerkleNode};
use crate::merkle::tree::MerkleTree;

/// Serializes a non-root node
struct NodeJson<'a>(&'a MerkleNode);

impl Serialize for NodeJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            MerkleNode::Leaf(leaf) => {
                let mut state = serializer.serialize_struct("LeafNode", 2)?;
                state.serialize_field("hash", &leaf.hash)?;
                state.serialize_field("data", &leaf.data)?;
                state.end()
            }
            MerkleNode::Internal(node) => {
                let mut state = serializer.serialize_struct("InternalNode", 3)?;
                state.serialize_field("hash", &node.hash)?;
                state.serialize_field("left", &NodeJson(&node.left))?;
                state.serialize_field("right", &NodeJson(&node.right))?;
                state.end()
            }
            MerkleNode::Nil => {
                let mut state = serializer.serialize_struct("NilNode", 1)?;
                state.serialize_field("hash", &MerkleHash::nil())?;
                state.end()
            }
        }
    }
}

impl Serialize for MerkleTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let root = self
            .root()
            .as_internal()
            .ok_or_else(|| S::Error::custom("tree root is not an internal node"))?;

        let mut state = serializer.serialize_struct("MerkleTree", 5)?;
        state.serialize_field("depth", &root.depth)?;
        state.serialize_field("hash", &root.hash)?;
        state.serialize_field("hash_fn", &self.hash_fn())?;
        state.serialize_field("left", &NodeJson(&root.left))?;
        state.serialize_field("right", &NodeJson(&root.right))?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    hash: MerkleHash,
    data: Option<PayoutLeafData>,
    left: Option<Box<RawNode>>,
    right: Option<Box<RawNode>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTree {
    depth: usize,
    hash: MerkleHash,
    hash_fn: HashFunction,
    left: RawNode,
    right: RawNode,
}

fn decode_node(raw: RawNode) -> PayoutTreeResult<MerkleNode> {
    match (raw.data, raw.left, raw.right) {
        (Some(data), None, None) => Ok(MerkleNode::Leaf(LeafNode { hash: raw.hash, data })),
        (None, Some(left), Some(right)) => {
            let left = decode_node(*left)?;
            let right = decode_node(*right)?;
            Ok(join(raw.hash, left, right))
        }
        (None, None, None) if raw.hash == MerkleHash::nil() => Ok(MerkleNode::Nil),
        (None, None, None) => Err(PayoutTreeError::MalformedTree(format!(
            "childless node without data must be nil, found hash {}",
            raw.hash
        ))),
        _ => Err(PayoutTreeError::MalformedTree(format!(
            "node {} mixes leaf data with children",
            raw.hash
        ))),
    }
}

fn join(hash: MerkleHash, left: MerkleNode, right: MerkleNode) -> MerkleNode {
    let depth = left.depth().max(right.depth()) + 1;
    MerkleNode::Internal(InternalNode {
        hash,
        left: Box::new(left),
        right: Box::new(right),
        depth,
    })
}

fn decode_tree(raw: RawTree) -> PayoutTreeResult<MerkleTree> {
    let left = decode_node(raw.left)?;
    let right = decode_node(raw.right)?;
    let root = join(raw.hash, left, right);

    if root.depth() != raw.depth {
        return Err(PayoutTreeError::MalformedTree(format!(
            "declared depth {} but tree has depth {}",
            raw.depth,
            root.depth()
        )));
    }

    root.verify(raw.hash_fn)?;

    let mut leaves = Vec::new();
    root.collect_leaves(&mut leaves);
    let leaves: Vec<PayoutLeafData> = leaves.into_iter().copied().collect();

    let tree = MerkleTree::new(leaves, raw.hash_fn)?;
    if tree.root() != &root {
        return Err(PayoutTreeError::MalformedTree(
            "node layout differs from the canonical layout for its leaves".to_string(),
        ));
    }

    Ok(tree)
}

impl<'de> Deserialize<'de> for MerkleTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTree::deserialize(deserializer)?;
        decode_tree(raw).map_err(D::Error::custom)
    }
}

impl MerkleTree {
    /// Canonical compact JSON
    pub fn to_json(&self) -> PayoutTreeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Canonical JSON, indented
    pub fn to_json_pretty(&self) -> PayoutTreeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode and validate a serialized tree
    pub fn from_json(json: &str) -> PayoutTreeResult<Self> {
        let raw: RawTree = serde_json::from_str(json)?;
        decode_tree(raw).map_err(|e| {
            warn!("Rejected serialized Merkle tree: {}", e);
            e
        })
    }
}
