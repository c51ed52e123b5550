//! Off-chain data commitments.
//!
//! Learning digests are Merkle roots over keccak-256 leaf hashes, pairing
//! siblings in sorted order (OpenZeppelin `MerkleProof` convention) so proofs
//! need no direction bits. An odd node at any level is carried up unchanged.
//! Vault digests are plain SHA-256 over the hosted bytes.

use alloy_primitives::{keccak256, B256};
use sha2::{Digest, Sha256};

/// Hash one learning record into a leaf.
pub fn learning_leaf(record: &[u8]) -> B256 {
    keccak256(record)
}

fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Merkle root over already-hashed leaves. Empty input commits to zero.
pub fn learning_merkle_root(leaves: &[B256]) -> B256 {
    if leaves.is_empty() {
        return B256::ZERO;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_pair(*a, *b),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level[0]
}

/// Verify that `leaf` is committed under `root` via a sorted-pair proof.
pub fn verify_learning_proof(root: B256, leaf: B256, proof: &[B256]) -> bool {
    proof.iter().fold(leaf, |acc, sibling| hash_pair(acc, *sibling)) == root
}

/// SHA-256 digest of externally hosted vault contents.
pub fn compute_vault_digest(content: &[u8]) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(content);
    B256::from_slice(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_root_is_zero() {
        assert_eq!(learning_merkle_root(&[]), B256::ZERO);
    }

    #[test]
    fn test_single_leaf_is_its_own_root() {
        let leaf = learning_leaf(b"episode-1");
        assert_eq!(learning_merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn test_pair_order_does_not_matter() {
        let a = learning_leaf(b"a");
        let b = learning_leaf(b"b");
        assert_eq!(learning_merkle_root(&[a, b]), learning_merkle_root(&[b, a]));
    }

    #[test]
    fn test_proof_verifies_for_four_leaves() {
        let leaves: Vec<B256> = (0u8..4).map(|i| learning_leaf(&[i])).collect();
        let root = learning_merkle_root(&leaves);
        let proof = [leaves[1], hash_pair(leaves[2], leaves[3])];
        assert!(verify_learning_proof(root, leaves[0], &proof));
        assert!(!verify_learning_proof(root, learning_leaf(b"forged"), &proof));
    }

    #[test]
    fn test_odd_leaf_is_carried() {
        let leaves: Vec<B256> = (0u8..3).map(|i| learning_leaf(&[i])).collect();
        let root = learning_merkle_root(&leaves);
        assert_eq!(root, hash_pair(hash_pair(leaves[0], leaves[1]), leaves[2]));
    }

    #[test]
    fn test_vault_digest_known_vector() {
        let digest = compute_vault_digest(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
