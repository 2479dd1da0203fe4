// src/merkle/mod.rs
//! Payout Merkle tree
//!
//! This module integrates the components of the payout tree:
//! - Hash functions and hash values
//! - ABI-style leaf encoding
//! - Tree nodes and bottom-up construction
//! - Inclusion proofs
//! - Canonical JSON form

mod hash;
mod json;
mod leaf;
mod node;
mod proof;
mod tree;

pub use hash::{HashFunction, Identity, Keccak256, MerkleHash, MerkleHasher, Sha256, NIL_HASH};
pub use leaf::{Balance, PayoutLeafData, WalletAddress, LEAF_ENCODING_LEN};
pub use node::{InternalNode, LeafNode, MerkleNode};
pub use proof::{PathSegment, Proof};
pub use tree::MerkleTree;
