//! Executor assembly: the Merkle tree over every leaf of a proposal, the
//! signing hash, signature verification against on-chain configurations, and
//! the per-chain submission payloads.

use crate::encoding::{
    build_merkle_tree, build_operations, build_root_metadatas, calculate_transaction_counts,
    hash_metadata_leaf, hash_op_leaf, sorted_chain_ids, Op, RootMetadata,
};
use crate::mcms::McmsProposal;
use alloy_primitives::{keccak256, Address, B256, U256};
use mcms_config::{Config, RawConfig};
use mcms_crypto::abi::{self, Token};
use mcms_crypto::{to_eth_signed_message_hash, Signature};
use mcms_merkle::MerkleTree;
use mcms_types::chain::ChainId;
use mcms_types::error::McmsError;
use mcms_types::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything needed to drive a signed proposal on chain, derived once from
/// a validated proposal and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Executor {
    /// The proposal snapshot the executor was built from.
    pub proposal: McmsProposal,
    /// Merkle tree over every metadata and operation leaf.
    pub tree: MerkleTree,
    /// Root metadata per chain.
    pub root_metadatas: BTreeMap<ChainId, RootMetadata>,
    /// Operations per chain, in nonce order.
    pub operations: BTreeMap<ChainId, Vec<Op>>,
    /// All operations in the proposal's original transaction order.
    pub chain_agnostic_ops: Vec<Op>,
}

/// The argument bundle for the verifier's `setRoot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRootArgs {
    /// The Merkle root being installed.
    pub root: B256,
    /// Expiry bound into the signing hash.
    pub valid_until: u32,
    /// The chain's root metadata.
    pub metadata: RootMetadata,
    /// Bottom-up sibling path proving the metadata leaf.
    pub metadata_proof: Vec<B256>,
    /// Signatures sorted ascending by recovered address, `v` in {27, 28}.
    pub signatures: Vec<Signature>,
}

/// The argument bundle for the verifier's `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteArgs {
    /// The operation to execute.
    pub op: Op,
    /// Bottom-up sibling path proving the operation leaf.
    pub proof: Vec<B256>,
}

impl Executor {
    /// Assembles the executor: transaction counts, root metadata, nonce
    /// assignment, and the Merkle tree over the sorted leaf list.
    ///
    /// `is_simulation` forces every metadata chain id to 1337, matching what
    /// a simulated backend reports for `block.chainid`.
    pub fn new(proposal: McmsProposal, is_simulation: bool) -> Result<Self> {
        let transaction_counts = calculate_transaction_counts(&proposal.transactions);
        let root_metadatas = build_root_metadatas(
            &proposal.chain_metadata,
            &transaction_counts,
            proposal.override_previous_root,
            is_simulation,
        )?;
        let (operations, chain_agnostic_ops) =
            build_operations(&proposal.transactions, &root_metadatas)?;
        let chain_ids = sorted_chain_ids(&proposal.chain_metadata);
        let tree = build_merkle_tree(&chain_ids, &root_metadatas, &operations)?;

        debug!(
            root = %tree.root,
            chains = chain_ids.len(),
            operations = chain_agnostic_ops.len(),
            "assembled proposal executor"
        );

        Ok(Executor {
            proposal,
            tree,
            root_metadatas,
            operations,
            chain_agnostic_ops,
        })
    }

    /// The unprefixed message: `keccak256(abi.encode(root, validUntil))`.
    ///
    /// Ledger-style signers apply the EIP-191 prefix themselves and sign
    /// this value directly.
    pub fn signing_message(&self) -> Result<B256> {
        let encoded = abi::encode(&[
            Token::FixedBytes(self.tree.root),
            Token::Uint(U256::from(self.proposal.valid_until), 32),
        ])?;
        Ok(keccak256(encoded))
    }

    /// The EIP-191-prefixed hash raw-key signers sign directly.
    pub fn signing_hash(&self) -> Result<B256> {
        Ok(to_eth_signed_message_hash(self.signing_message()?))
    }

    /// Recovers the signer address of every collected signature.
    fn recovered_signers(&self) -> Result<Vec<Address>> {
        let hash = self.signing_hash()?;
        self.proposal
            .signatures
            .iter()
            .map(|signature| signature.recover(hash))
            .collect()
    }

    fn mcm_address_of(&self, chain: ChainId) -> Address {
        self.root_metadatas
            .get(&chain)
            .map(|metadata| metadata.mcm_address)
            .unwrap_or_default()
    }

    /// Verifies the collected signatures against one chain's configuration.
    ///
    /// Every recovered address must be a signer somewhere in the raw config
    /// and the recovered set must satisfy the root group's quorum tree.
    pub fn check_quorum(&self, chain: ChainId, raw_config: &RawConfig) -> Result<bool> {
        let recovered = self.recovered_signers()?;

        for signer in &recovered {
            if !raw_config.signers.iter().any(|s| s.addr == *signer) {
                return Err(McmsError::InvalidSignature {
                    chain,
                    mcm_address: self.mcm_address_of(chain),
                    recovered: *signer,
                });
            }
        }

        let config = Config::from_raw(raw_config)?;
        if !config.is_group_at_consensus(&recovered) {
            return Err(McmsError::QuorumNotMet { chain });
        }
        Ok(true)
    }

    /// Verifies the collected signatures against every chain's configuration.
    ///
    /// Membership is checked for all chains before any quorum is evaluated,
    /// so an unknown signer surfaces as `InvalidSignature` rather than as a
    /// quorum failure.
    pub fn validate_signatures(
        &self,
        configs: &BTreeMap<ChainId, RawConfig>,
    ) -> Result<bool> {
        let recovered = self.recovered_signers()?;

        for chain in self.proposal.chain_metadata.keys() {
            let raw_config = configs
                .get(chain)
                .ok_or(McmsError::MissingChainClient { chain: *chain })?;
            for signer in &recovered {
                if !raw_config.signers.iter().any(|s| s.addr == *signer) {
                    return Err(McmsError::InvalidSignature {
                        chain: *chain,
                        mcm_address: self.mcm_address_of(*chain),
                        recovered: *signer,
                    });
                }
            }
        }

        for chain in self.proposal.chain_metadata.keys() {
            let raw_config = configs
                .get(chain)
                .ok_or(McmsError::MissingChainClient { chain: *chain })?;
            let config = Config::from_raw(raw_config)?;
            if !config.is_group_at_consensus(&recovered) {
                return Err(McmsError::QuorumNotMet { chain: *chain });
            }
        }

        Ok(true)
    }

    /// Checks that every chain of the proposal carries a structurally equal
    /// signer configuration.
    pub fn validate_consistent_configs(
        &self,
        configs: &BTreeMap<ChainId, RawConfig>,
    ) -> Result<()> {
        let chains = sorted_chain_ids(&self.proposal.chain_metadata);
        let mut parsed: BTreeMap<ChainId, Config> = BTreeMap::new();
        for chain in &chains {
            let raw_config = configs
                .get(chain)
                .ok_or(McmsError::MissingChainClient { chain: *chain })?;
            parsed.insert(*chain, Config::from_raw(raw_config)?);
        }

        for pair in chains.windows(2) {
            if let [previous, current] = pair {
                if parsed.get(current) != parsed.get(previous) {
                    return Err(McmsError::InconsistentConfigs {
                        chain_a: *current,
                        chain_b: *previous,
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the `setRoot` argument bundle for one chain: the root, the
    /// expiry, the chain's metadata with its Merkle proof, and the collected
    /// signatures sorted ascending by recovered address (the order the
    /// verifier requires).
    pub fn set_root_args(&self, chain: ChainId) -> Result<SetRootArgs> {
        let metadata = self
            .root_metadatas
            .get(&chain)
            .ok_or_else(|| McmsError::MissingChainDetails {
                chain,
                parameter: "root metadata".to_string(),
            })?;
        let metadata_proof = self.tree.proof(hash_metadata_leaf(metadata)?)?;

        let hash = self.signing_hash()?;
        let mut signers: Vec<(Address, Signature)> = self
            .proposal
            .signatures
            .iter()
            .map(|signature| Ok((signature.recover(hash)?, signature.to_wire())))
            .collect::<Result<_>>()?;
        signers.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(SetRootArgs {
            root: self.tree.root,
            valid_until: self.proposal.valid_until,
            metadata: metadata.clone(),
            metadata_proof,
            signatures: signers.into_iter().map(|(_, signature)| signature).collect(),
        })
    }

    /// Builds the `execute` argument bundle for the operation at `index` in
    /// the proposal's original transaction order.
    pub fn execute_args(&self, index: usize) -> Result<ExecuteArgs> {
        let op = self
            .chain_agnostic_ops
            .get(index)
            .ok_or(McmsError::InvalidOperationIndex {
                index,
                count: self.chain_agnostic_ops.len(),
            })?;
        let proof = self.tree.proof(hash_op_leaf(op)?)?;
        Ok(ExecuteArgs {
            op: op.clone(),
            proof,
        })
    }
}
