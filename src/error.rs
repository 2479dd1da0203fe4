// src/error.rs
//! Error types for the payout Merkle tree

use thiserror::Error;

/// Errors raised while building, querying or decoding a payout tree
#[derive(Error, Debug)]
pub enum PayoutTreeError {
    /// A snapshot without entitlements has no root
    #[error("Cannot build a Merkle tree from an empty leaf list")]
    EmptyTree,

    /// Proof requested for a leaf that does not exist
    #[error("Leaf index {index} out of range for tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    /// Malformed wallet address
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Malformed or oversized balance
    #[error("Invalid balance: {0}")]
    InvalidBalance(String),

    /// Malformed hex hash
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    /// Hash function name not recognized
    #[error("Unknown hash function: {0}")]
    UnknownHashFunction(String),

    /// Stored node hash cannot be reproduced with the tree's hash function
    #[error("Hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Rebuilt tree does not commit to the stored root
    #[error("Root mismatch: expected {expected}, computed {actual}")]
    RootMismatch { expected: String, actual: String },

    /// Serialized tree does not describe a valid payout tree
    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for payout tree operations
pub type PayoutTreeResult<T> = Result<T, PayoutTreeError>;
