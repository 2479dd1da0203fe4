// src/config.rs
//! Tree construction settings

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{PayoutTreeError, PayoutTreeResult};
use crate::merkle::HashFunction;

/// Environment variable selecting the hash function
pub const HASH_FN_ENV: &str = "PAYOUT_TREE_HASH_FN";

/// Environment variable setting the parallel pairing threshold
pub const PARALLEL_THRESHOLD_ENV: &str = "PAYOUT_TREE_PARALLEL_THRESHOLD";

/// Default level width from which hashing runs on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// Payout tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Hash function used for every node of the tree
    pub hash_fn: HashFunction,

    /// Levels at least this wide are hashed in parallel
    pub parallel_threshold: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            hash_fn: HashFunction::Keccak256,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl TreeConfig {
    /// Config with the given hash function and default threshold
    pub fn with_hash_fn(hash_fn: HashFunction) -> Self {
        Self {
            hash_fn,
            ..Self::default()
        }
    }

    /// Read overrides from the environment, keeping defaults for unset variables
    pub fn from_env() -> PayoutTreeResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> PayoutTreeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(HASH_FN_ENV) {
            config.hash_fn = value
                .parse()
                .map_err(|e| PayoutTreeError::Config(format!("{}: {}", HASH_FN_ENV, e)))?;
        }

        if let Some(value) = lookup(PARALLEL_THRESHOLD_ENV) {
            config.parallel_threshold = value.trim().parse().map_err(|e| {
                PayoutTreeError::Config(format!("{}={}: {}", PARALLEL_THRESHOLD_ENV, value, e))
            })?;
        }

        Ok(config)
    }
}
