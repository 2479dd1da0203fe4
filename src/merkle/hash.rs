// src/merkle/hash.rs
//! Hash values and hashing strategies for the payout Merkle tree
//!
//! Every tree is built with exactly one `HashFunction`, which is applied
//! to leaf encodings and to concatenated child hashes alike.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256 as Sha256Digest;
use sha3::{Digest, Keccak256 as Keccak256Digest};

use crate::error::{PayoutTreeError, PayoutTreeResult};

/// Value of the padding sentinel. Reserved, never produced by hashing.
pub const NIL_HASH: [u8; 32] = [0u8; 32];

/// Hash of a Merkle tree node
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize)]
pub struct MerkleHash(Vec<u8>);

impl MerkleHash {
    /// Wrap raw hash bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The padding sentinel hash
    pub fn nil() -> Self {
        Self(NIL_HASH.to_vec())
    }

    /// Raw bytes of the hash
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `self ++ other`, the input to an internal node hash
    pub fn concat(&self, other: &MerkleHash) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.0.len() + other.0.len());
        input.extend_from_slice(&self.0);
        input.extend_from_slice(&other.0);
        input
    }

    /// `0x`-prefixed lowercase hex form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Parse a hex hash, with or without the `0x` / `0X` prefix
    pub fn from_hex(value: &str) -> PayoutTreeResult<Self> {
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);
        hex::decode(digits)
            .map(Self)
            .map_err(|e| PayoutTreeError::InvalidHash(format!("{}: {}", value, e)))
    }
}

impl From<Vec<u8>> for MerkleHash {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerkleHash({})", self.to_hex())
    }
}

impl Serialize for MerkleHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MerkleHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <String as Deserialize>::deserialize(deserializer)?;
        MerkleHash::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// A hashing strategy usable for Merkle tree nodes
pub trait MerkleHasher {
    /// Hash arbitrary-length input
    fn hash(&self, input: &[u8]) -> MerkleHash;
}

/// Returns its input unchanged. Makes tree structure visible in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl MerkleHasher for Identity {
    fn hash(&self, input: &[u8]) -> MerkleHash {
        MerkleHash(input.to_vec())
    }
}

/// Keccak-256, as computed by EVM `keccak256`
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256;

impl MerkleHasher for Keccak256 {
    fn hash(&self, input: &[u8]) -> MerkleHash {
        MerkleHash(Keccak256Digest::digest(input).to_vec())
    }
}

/// SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl MerkleHasher for Sha256 {
    fn hash(&self, input: &[u8]) -> MerkleHash {
        MerkleHash(Sha256Digest::digest(input).to_vec())
    }
}

/// Selects the hashing strategy of a tree.
///
/// The name is stored alongside serialized trees so that verifiers know
/// which strategy to apply. Verifying with a different strategy than the
/// tree was built with does not raise an error; the recomputed root simply
/// will not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashFunction {
    #[serde(rename = "IDENTITY")]
    Identity,
    #[default]
    #[serde(rename = "KECCAK_256")]
    Keccak256,
    #[serde(rename = "SHA_256")]
    Sha256,
}

impl HashFunction {
    /// Canonical name, as written in serialized trees
    pub fn name(&self) -> &'static str {
        match self {
            HashFunction::Identity => "IDENTITY",
            HashFunction::Keccak256 => "KECCAK_256",
            HashFunction::Sha256 => "SHA_256",
        }
    }

    /// Hash the concatenation of two child hashes
    pub fn hash_pair(&self, left: &MerkleHash, right: &MerkleHash) -> MerkleHash {
        self.hash(&left.concat(right))
    }
}

impl MerkleHasher for HashFunction {
    fn hash(&self, input: &[u8]) -> MerkleHash {
        match self {
            HashFunction::Identity => Identity.hash(input),
            HashFunction::Keccak256 => Keccak256.hash(input),
            HashFunction::Sha256 => Sha256.hash(input),
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashFunction {
    type Err = PayoutTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "IDENTITY" => Ok(HashFunction::Identity),
            "KECCAK_256" | "KECCAK256" => Ok(HashFunction::Keccak256),
            "SHA_256" | "SHA256" => Ok(HashFunction::Sha256),
            _ => Err(PayoutTreeError::UnknownHashFunction(s.to_string())),
        }
    }
}
