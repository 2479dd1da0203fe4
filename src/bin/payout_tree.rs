// src/bin/payout_tree.rs
//! Command-line access to payout Merkle trees.
//!
//! Snapshots are JSON arrays of `{ "address": "0x..", "balance": ".." }`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde_json::json;

use payout_merkle::{
    HashFunction, MerkleTree, PayoutLeafData, Proof, TreeConfig, WalletAddress,
};

/// Build payout snapshot trees and inclusion proofs
#[derive(Parser)]
#[command(name = "payout-tree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Hash function (IDENTITY, KECCAK_256, SHA_256); overrides PAYOUT_TREE_HASH_FN
    #[arg(long, global = true)]
    hash_fn: Option<HashFunction>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the root hash of a snapshot
    Root {
        /// Snapshot file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the canonical JSON tree of a snapshot
    Tree {
        /// Snapshot file
        #[arg(short, long)]
        input: PathBuf,

        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the inclusion proof of one entitlement
    Proof {
        /// Snapshot file
        #[arg(short, long)]
        input: PathBuf,

        /// Leaf index
        #[arg(long, conflicts_with = "address", required_unless_present = "address")]
        index: Option<usize>,

        /// Wallet address
        #[arg(long)]
        address: Option<WalletAddress>,
    },

    /// Check a proof against a serialized tree
    Verify {
        /// Serialized tree file
        #[arg(long)]
        tree: PathBuf,

        /// Proof file
        #[arg(long)]
        proof: PathBuf,

        /// Claimed wallet address
        #[arg(long)]
        address: String,

        /// Claimed balance
        #[arg(long)]
        balance: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = TreeConfig::from_env().context("invalid environment configuration")?;
    if let Some(hash_fn) = cli.hash_fn {
        config.hash_fn = hash_fn;
    }

    match cli.command {
        Commands::Root { input } => {
            let tree = load_snapshot_tree(&input, &config)?;
            let summary = json!({
                "root": tree.root_hash(),
                "depth": tree.depth(),
                "leaf_count": tree.leaf_count(),
                "hash_fn": tree.hash_fn(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Tree { input, pretty } => {
            let tree = load_snapshot_tree(&input, &config)?;
            let json = if pretty {
                tree.to_json_pretty()?
            } else {
                tree.to_json()?
            };
            println!("{}", json);
        }
        Commands::Proof { input, index, address } => {
            let tree = load_snapshot_tree(&input, &config)?;
            let index = match (index, address) {
                (Some(index), _) => index,
                (None, Some(address)) => {
                    tree.leaf_by_address(&address)
                        .with_context(|| format!("no entitlement for {}", address))?
                        .0
                }
                (None, None) => bail!("either --index or --address is required"),
            };
            let proof = tree.prove_inclusion(index)?;
            let data = tree
                .leaf(index)
                .copied()
                .with_context(|| format!("no entitlement at index {}", index))?;

            let output = json!({
                "root": tree.root_hash(),
                "hash_fn": tree.hash_fn(),
                "index": index,
                "data": data,
                "proof": proof,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Verify {
            tree,
            proof,
            address,
            balance,
        } => {
            let tree_json = read_file(&tree)?;
            let tree = MerkleTree::from_json(&tree_json)
                .with_context(|| format!("invalid tree in {}", tree.display()))?;
            let proof: Proof = serde_json::from_str(&read_file(&proof)?)
                .with_context(|| format!("invalid proof in {}", proof.display()))?;
            let claimed = PayoutLeafData::parse(&address, &balance)?;

            let valid = tree.verify_proof(&claimed, &proof);
            info!("Proof for {} against root {}: {}", claimed.address, tree.root_hash(), valid);
            println!("{}", if valid { "valid" } else { "invalid" });
            return Ok(valid);
        }
    }

    Ok(true)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_snapshot_tree(path: &Path, config: &TreeConfig) -> Result<MerkleTree> {
    let leaves: Vec<PayoutLeafData> = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("invalid snapshot in {}", path.display()))?;
    info!("Loaded {} entitlements from {}", leaves.len(), path.display());

    MerkleTree::with_config(leaves, config)
        .with_context(|| format!("failed to build tree for {}", path.display()))
}
