// tests/payout_tree_cli_test.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

use payout_merkle::{HashFunction, MerkleTree, PayoutLeafData, Proof};

const SNAPSHOT: &str = r#"[
    {"address": "0x8ba1f109551bd432803012645ac136ddd64dba72", "balance": "1500000000000000000"},
    {"address": "0xab5801a7d398351b8be11c439e05c5b3259aec9b", "balance": "250"},
    {"address": "0x0000000000000000000000000000000000000001", "balance": "0"},
    {"address": "0xab5801a7d398351b8be11c439e05c5b3259aec9b", "balance": "7"}
]"#;

fn payout_tree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_payout-tree"))
        .args(args)
        .env_remove("PAYOUT_TREE_HASH_FN")
        .env_remove("PAYOUT_TREE_PARALLEL_THRESHOLD")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn library_tree(hash_fn: HashFunction) -> (Vec<PayoutLeafData>, MerkleTree) {
    let leaves: Vec<PayoutLeafData> = serde_json::from_str(SNAPSHOT).unwrap();
    let tree = MerkleTree::new(leaves.clone(), hash_fn).unwrap();
    (leaves, tree)
}

/// Writes the snapshot, its serialized tree and the proof for `index`
fn prepare_verify_inputs(dir: &TempDir, index: usize) -> (PathBuf, PathBuf) {
    let snapshot = write(dir, "snapshot.json", SNAPSHOT);

    let output = payout_tree(&["tree", "--input", arg(&snapshot)]);
    assert_eq!(output.status.code(), Some(0));
    let tree = write(dir, "tree.json", &stdout(&output));

    let index = index.to_string();
    let output = payout_tree(&["proof", "--input", arg(&snapshot), "--index", &index]);
    assert_eq!(output.status.code(), Some(0));
    let response: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let proof = write(dir, "proof.json", &response["proof"].to_string());

    (tree, proof)
}

#[test]
fn test_root_matches_library() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snapshot.json", SNAPSHOT);
    let (_, tree) = library_tree(HashFunction::Keccak256);

    let output = payout_tree(&["root", "--input", arg(&snapshot)]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let summary: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["root"], Value::String(tree.root_hash().to_hex()));
    assert_eq!(summary["depth"], 2);
    assert_eq!(summary["leaf_count"], 4);
    assert_eq!(summary["hash_fn"], "KECCAK_256");
}

#[test]
fn test_hash_fn_flag_selects_function() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snapshot.json", SNAPSHOT);
    let (_, tree) = library_tree(HashFunction::Sha256);

    let output = payout_tree(&["root", "--input", arg(&snapshot), "--hash-fn", "SHA_256"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let summary: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["root"], Value::String(tree.root_hash().to_hex()));
    assert_eq!(summary["hash_fn"], "SHA_256");
}

#[test]
fn test_tree_prints_canonical_json() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snapshot.json", SNAPSHOT);
    let (_, tree) = library_tree(HashFunction::Keccak256);

    let output = payout_tree(&["tree", "--input", arg(&snapshot)]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim_end(), tree.to_json().unwrap());
}

#[test]
fn test_proof_by_index_and_address() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snapshot.json", SNAPSHOT);
    let (leaves, tree) = library_tree(HashFunction::Keccak256);

    let output = payout_tree(&["proof", "--input", arg(&snapshot), "--index", "3"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let response: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let proof: Proof = serde_json::from_value(response["proof"].clone()).unwrap();
    assert_eq!(response["index"], 3);
    assert_eq!(proof, tree.prove_inclusion(3).unwrap());
    assert!(proof.verify(&leaves[3], &tree.root_hash(), HashFunction::Keccak256));

    // Duplicate address resolves to its first entitlement
    let address = leaves[1].address.to_string();
    let output = payout_tree(&["proof", "--input", arg(&snapshot), "--address", &address]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let response: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(response["index"], 1);
    assert_eq!(response["data"]["balance"], "250");
}

#[test]
fn test_proof_out_of_range_reports_library_error() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snapshot.json", SNAPSHOT);

    let output = payout_tree(&["proof", "--input", arg(&snapshot), "--index", "4"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("Leaf index 4 out of range for tree with 4 leaves"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_verify_exit_codes() {
    let dir = TempDir::new().unwrap();
    let (tree, proof) = prepare_verify_inputs(&dir, 1);

    let valid = payout_tree(&[
        "verify",
        "--tree",
        arg(&tree),
        "--proof",
        arg(&proof),
        "--address",
        "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
        "--balance",
        "250",
    ]);
    assert_eq!(valid.status.code(), Some(0), "stderr: {}", stderr(&valid));
    assert_eq!(stdout(&valid).trim(), "valid");

    let tampered = payout_tree(&[
        "verify",
        "--tree",
        arg(&tree),
        "--proof",
        arg(&proof),
        "--address",
        "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
        "--balance",
        "251",
    ]);
    assert_eq!(tampered.status.code(), Some(1));
    assert_eq!(stdout(&tampered).trim(), "invalid");

    let bad_address = payout_tree(&[
        "verify",
        "--tree",
        arg(&tree),
        "--proof",
        arg(&proof),
        "--address",
        "0xnothex",
        "--balance",
        "250",
    ]);
    assert_eq!(bad_address.status.code(), Some(2));
}

#[test]
fn test_errors_exit_with_code_two() {
    let dir = TempDir::new().unwrap();
    let empty = write(&dir, "empty.json", "[]");
    let output = payout_tree(&["root", "--input", arg(&empty)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("empty leaf list"), "stderr: {}", stderr(&output));

    let missing = dir.path().join("missing.json");
    let output = payout_tree(&["tree", "--input", arg(&missing)]);
    assert_eq!(output.status.code(), Some(2));

    let snapshot = write(&dir, "snapshot.json", SNAPSHOT);
    let output = payout_tree(&["tree", "--input", arg(&snapshot), "--hash-fn", "MD5"]);
    assert_eq!(output.status.code(), Some(2));
}
