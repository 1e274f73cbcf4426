//! Leaf encoding: root metadata and operations in the verifier's byte layout.
//!
//! Each leaf is the keccak-256 of an `abi.encode` frame whose first word is a
//! domain separator distinguishing metadata leaves from operation leaves. The
//! separators are the hashes of exact ASCII literals shared with the on-chain
//! contract; any wrapper around them breaks verification.

use crate::mcms::{ChainMetadata, ChainOperation};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use mcms_crypto::abi::{self, Token};
use mcms_merkle::MerkleTree;
use mcms_types::chain::{chain_by_selector, ChainId, SIMULATED_EVM_CHAIN_ID};
use mcms_types::error::McmsError;
use mcms_types::Result;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Domain separator prefixed into operation leaves.
pub fn op_domain_separator() -> B256 {
    static SEPARATOR: OnceLock<B256> = OnceLock::new();
    *SEPARATOR.get_or_init(|| keccak256(b"MANY_CHAIN_MULTI_SIG_DOMAIN_SEPARATOR_OP"))
}

/// Domain separator prefixed into root-metadata leaves.
pub fn metadata_domain_separator() -> B256 {
    static SEPARATOR: OnceLock<B256> = OnceLock::new();
    *SEPARATOR.get_or_init(|| keccak256(b"MANY_CHAIN_MULTI_SIG_DOMAIN_SEPARATOR_METADATA"))
}

/// Mirror of the verifier's root-metadata struct.
///
/// `pre_op_count` and `post_op_count` are `uint40` on chain; they are carried
/// as `u64` here and range-checked when encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMetadata {
    /// The EVM chain id the verifier compares against `block.chainid`.
    pub chain_id: U256,
    /// The multisig contract the root is installed on.
    pub mcm_address: Address,
    /// Operation count before this proposal executes.
    pub pre_op_count: u64,
    /// Operation count after every operation of this proposal executed.
    pub post_op_count: u64,
    /// Whether installing this root may discard a partially executed one.
    pub override_previous_root: bool,
}

/// Mirror of the verifier's operation struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    /// The EVM chain id this operation is bound to.
    pub chain_id: U256,
    /// The multisig contract that will perform the call.
    pub mcm_address: Address,
    /// Position in the chain's operation sequence (`uint40` on chain).
    pub nonce: u64,
    /// The contract to call.
    pub to: Address,
    /// Native value attached to the call.
    pub value: U256,
    /// Calldata passed through verbatim.
    pub data: Bytes,
}

/// Hashes a root-metadata leaf.
pub fn hash_metadata_leaf(metadata: &RootMetadata) -> Result<B256> {
    let encoded = abi::encode(&[
        Token::FixedBytes(metadata_domain_separator()),
        Token::Tuple(vec![
            Token::Uint(metadata.chain_id, 256),
            Token::Address(metadata.mcm_address),
            Token::Uint(U256::from(metadata.pre_op_count), 40),
            Token::Uint(U256::from(metadata.post_op_count), 40),
            Token::Bool(metadata.override_previous_root),
        ]),
    ])?;
    Ok(keccak256(encoded))
}

/// Hashes an operation leaf.
pub fn hash_op_leaf(op: &Op) -> Result<B256> {
    let encoded = abi::encode(&[
        Token::FixedBytes(op_domain_separator()),
        Token::Tuple(vec![
            Token::Uint(op.chain_id, 256),
            Token::Address(op.mcm_address),
            Token::Uint(U256::from(op.nonce), 40),
            Token::Address(op.to),
            Token::Uint(op.value, 256),
            Token::Bytes(op.data.to_vec()),
        ]),
    ])?;
    Ok(keccak256(encoded))
}

/// Counts the transactions per chain.
pub(crate) fn calculate_transaction_counts(
    transactions: &[ChainOperation],
) -> BTreeMap<ChainId, u64> {
    let mut counts = BTreeMap::new();
    for transaction in transactions {
        *counts.entry(transaction.chain_id).or_insert(0) += 1;
    }
    counts
}

/// Assembles the root metadata for every chain of the proposal.
///
/// `pre_op_count` is taken as the absolute starting count supplied in the
/// chain metadata. For simulated backends the EVM chain id is forced to
/// 1337, since that is what the verifier reads from `block.chainid` there.
pub(crate) fn build_root_metadatas(
    chain_metadata: &BTreeMap<ChainId, ChainMetadata>,
    transaction_counts: &BTreeMap<ChainId, u64>,
    override_previous_root: bool,
    is_simulation: bool,
) -> Result<BTreeMap<ChainId, RootMetadata>> {
    let mut root_metadatas = BTreeMap::new();

    for (chain, metadata) in chain_metadata {
        let info = chain_by_selector(*chain).ok_or(McmsError::InvalidChainId { chain: *chain })?;
        let count = transaction_counts
            .get(chain)
            .copied()
            .ok_or_else(|| McmsError::MissingChainDetails {
                chain: *chain,
                parameter: "transaction count".to_string(),
            })?;

        let evm_chain_id = if is_simulation {
            SIMULATED_EVM_CHAIN_ID
        } else {
            info.evm_chain_id
        };

        root_metadatas.insert(
            *chain,
            RootMetadata {
                chain_id: U256::from(evm_chain_id),
                mcm_address: metadata.mcm_address,
                pre_op_count: metadata.starting_op_count,
                post_op_count: metadata.starting_op_count + count,
                override_previous_root,
            },
        );
    }
    Ok(root_metadatas)
}

/// Assigns nonces and assembles the per-chain and chain-agnostic operation
/// lists, preserving the proposal's transaction order.
pub(crate) fn build_operations(
    transactions: &[ChainOperation],
    root_metadatas: &BTreeMap<ChainId, RootMetadata>,
) -> Result<(BTreeMap<ChainId, Vec<Op>>, Vec<Op>)> {
    let mut operations: BTreeMap<ChainId, Vec<Op>> = BTreeMap::new();
    let mut chain_agnostic_ops = Vec::with_capacity(transactions.len());
    let mut next_index: BTreeMap<ChainId, u64> = BTreeMap::new();

    for transaction in transactions {
        let metadata = root_metadatas
            .get(&transaction.chain_id)
            .ok_or_else(|| McmsError::MissingChainDetails {
                chain: transaction.chain_id,
                parameter: "root metadata".to_string(),
            })?;
        let index = next_index.entry(transaction.chain_id).or_insert(0);

        let op = Op {
            chain_id: metadata.chain_id,
            mcm_address: metadata.mcm_address,
            nonce: metadata.pre_op_count + *index,
            to: transaction.op.to,
            value: transaction.op.value,
            data: transaction.op.data.clone(),
        };

        chain_agnostic_ops.push(op.clone());
        operations.entry(transaction.chain_id).or_default().push(op);
        *index += 1;
    }

    Ok((operations, chain_agnostic_ops))
}

/// The proposal's chains in ascending selector order.
pub(crate) fn sorted_chain_ids(
    chain_metadata: &BTreeMap<ChainId, ChainMetadata>,
) -> Vec<ChainId> {
    chain_metadata.keys().copied().collect()
}

/// Collects every leaf (per chain: metadata first, then its operations in
/// nonce order), sorts the leaf list byte-wise ascending, and builds the
/// Merkle tree.
pub(crate) fn build_merkle_tree(
    chain_ids: &[ChainId],
    root_metadatas: &BTreeMap<ChainId, RootMetadata>,
    operations: &BTreeMap<ChainId, Vec<Op>>,
) -> Result<MerkleTree> {
    let mut leaves = Vec::new();

    for chain in chain_ids {
        let metadata = root_metadatas
            .get(chain)
            .ok_or_else(|| McmsError::MissingChainDetails {
                chain: *chain,
                parameter: "root metadata".to_string(),
            })?;
        leaves.push(hash_metadata_leaf(metadata)?);

        for op in operations.get(chain).into_iter().flatten() {
            leaves.push(hash_op_leaf(op)?);
        }
    }

    leaves.sort();
    Ok(MerkleTree::new(leaves))
}
