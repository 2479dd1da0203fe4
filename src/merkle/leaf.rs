// src/merkle/leaf.rs
//! Payout leaf payloads and their ABI-style encoding
//!
//! A leaf is encoded exactly as Solidity's `abi.encode(address, uint256)`:
//! the address left-padded to 32 bytes, followed by the balance as a
//! 32-byte big-endian integer. Contracts recompute these bytes to verify
//! claims, so the layout must never change.

use std::fmt;
use std::str::FromStr;

use primitive_types::{H160, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PayoutTreeError, PayoutTreeResult};

/// Size of an encoded leaf
pub const LEAF_ENCODING_LEN: usize = 64;

const ADDRESS_LEN: usize = 20;
const ADDRESS_PADDING: usize = 32 - ADDRESS_LEN;

/// 20-byte wallet address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct WalletAddress(H160);

impl WalletAddress {
    /// Address from raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(H160::from(bytes))
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// `0x` followed by 40 lowercase hex digits
    pub fn to_canonical_string(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl FromStr for WalletAddress {
    type Err = PayoutTreeError;

    /// Parses `0x`-prefixed or bare hex. Short values are left-padded,
    /// so `"0x1"` is the address ending in `01`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

        if digits.is_empty() || digits.len() > ADDRESS_LEN * 2 {
            return Err(PayoutTreeError::InvalidAddress(format!(
                "{}: expected 1 to {} hex digits",
                s,
                ADDRESS_LEN * 2
            )));
        }

        let padded = format!("{:0>width$}", digits, width = ADDRESS_LEN * 2);
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| PayoutTreeError::InvalidAddress(format!("{}: {}", s, e)))?;

        Ok(Self::from_bytes(bytes))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletAddress({})", self.to_canonical_string())
    }
}

impl Serialize for WalletAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Token balance, bounded by `uint256`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Balance(U256);

impl Balance {
    pub const ZERO: Balance = Balance(U256([0; 4]));

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// 32-byte big-endian form
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        bytes
    }
}

impl From<u64> for Balance {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Balance {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for Balance {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for Balance {
    type Err = PayoutTreeError;

    /// Parses a base-10 integer that fits in 256 bits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PayoutTreeError::InvalidBalance(format!(
                "{}: expected an unsigned base-10 integer",
                s
            )));
        }

        U256::from_dec_str(s)
            .map(Self)
            .map_err(|e| PayoutTreeError::InvalidBalance(format!("{}: {:?}", s, e)))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Balance({})", self.0)
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// One entitlement: a wallet and the balance it may claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutLeafData {
    pub address: WalletAddress,
    pub balance: Balance,
}

impl PayoutLeafData {
    pub fn new(address: WalletAddress, balance: Balance) -> Self {
        Self { address, balance }
    }

    /// Parse an entitlement from its textual address and balance
    pub fn parse(address: &str, balance: &str) -> PayoutTreeResult<Self> {
        Ok(Self {
            address: address.parse()?,
            balance: balance.parse()?,
        })
    }

    /// ABI-style encoding of `(address, uint256)`
    pub fn abi_encode(&self) -> [u8; LEAF_ENCODING_LEN] {
        let mut out = [0u8; LEAF_ENCODING_LEN];
        out[ADDRESS_PADDING..32].copy_from_slice(self.address.as_bytes());
        out[32..].copy_from_slice(&self.balance.to_be_bytes());
        out
    }
}
