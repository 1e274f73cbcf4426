#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! # MCMS Merkle Engine
//!
//! A binary Merkle tree over 32-byte leaves with the sort-pair rule of the
//! on-chain verifier: each pair is ordered by unsigned byte comparison before
//! hashing, and a layer with an odd node count duplicates its terminal node.
//! Construction is deterministic for a fixed leaf list; callers that need
//! order independence sort the leaves first.

use alloy_primitives::{keccak256, B256};
use mcms_types::error::McmsError;
use mcms_types::Result;
use std::collections::BTreeMap;

/// Hashes an ordered pair: `keccak256(min(a, b) || max(a, b))`.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut combined = [0u8; 64];
    let (head, tail) = combined.split_at_mut(32);
    head.copy_from_slice(low.as_slice());
    tail.copy_from_slice(high.as_slice());
    keccak256(combined)
}

/// Folds `proof` over `leaf` with [`hash_pair`] and compares against `root`.
pub fn verify_proof(leaf: B256, proof: &[B256], root: B256) -> bool {
    proof
        .iter()
        .fold(leaf, |node, sibling| hash_pair(node, *sibling))
        == root
}

/// A fully materialized Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Root hash of the tree.
    pub root: B256,
    /// Tree layers, leaves first. Each stored layer has an even node count;
    /// a duplicated terminal node is stored where the input count was odd.
    /// A single-leaf tree stores no layers at all.
    pub layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Builds the tree bottom-up from a leaf list.
    pub fn new(leaves: Vec<B256>) -> Self {
        let mut layers = Vec::new();
        let mut current = leaves;

        while current.len() > 1 {
            if current.len() % 2 != 0 {
                if let Some(last) = current.last().copied() {
                    current.push(last);
                }
            }
            layers.push(current.clone());

            let mut parents = Vec::with_capacity(current.len() / 2);
            for pair in current.chunks_exact(2) {
                if let [left, right] = pair {
                    parents.push(hash_pair(*left, *right));
                }
            }
            current = parents;
        }

        MerkleTree {
            root: current.first().copied().unwrap_or(B256::ZERO),
            layers,
        }
    }

    /// Produces the bottom-up sibling path for `leaf`.
    ///
    /// Walks every stored layer, recording the sibling at `index ^ 1` and
    /// folding the target upward. Fails with [`McmsError::MerkleNodeNotFound`]
    /// if the running target is absent from any layer.
    pub fn proof(&self, leaf: B256) -> Result<Vec<B256>> {
        let mut proof = Vec::with_capacity(self.layers.len());
        let mut target = leaf;

        for layer in &self.layers {
            let position = layer
                .iter()
                .position(|node| *node == target)
                .ok_or(McmsError::MerkleNodeNotFound { hash: target })?;
            let sibling = layer
                .get(position ^ 1)
                .copied()
                .ok_or(McmsError::MerkleNodeNotFound { hash: target })?;
            proof.push(sibling);
            target = hash_pair(target, sibling);
        }

        if target == self.root {
            Ok(proof)
        } else {
            Err(McmsError::MerkleNodeNotFound { hash: leaf })
        }
    }

    /// Produces the proof for every leaf of the tree, keyed by leaf hash.
    pub fn proofs(&self) -> Result<BTreeMap<B256, Vec<B256>>> {
        let Some(leaves) = self.layers.first() else {
            // A single-leaf tree proves membership with an empty path.
            return Ok(BTreeMap::from([(self.root, Vec::new())]));
        };

        let mut proofs = BTreeMap::new();
        for leaf in leaves {
            proofs.insert(*leaf, self.proof(*leaf)?);
        }
        Ok(proofs)
    }
}
