//! Core error types for the MCMS toolkit.

use crate::chain::ChainId;
use alloy_primitives::{Address, B256};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// The single error taxonomy surfaced by every public operation of the core.
///
/// Every variant carries the offending chain, address, or parameter so that
/// callers can print an actionable message without re-deriving context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum McmsError {
    /// The proposal carried an empty or unrecognized version string.
    #[error("invalid version: {received}")]
    InvalidVersion {
        /// The version string as received.
        received: String,
    },
    /// The proposal expiry is not in the future.
    #[error("invalid valid until: {received}")]
    InvalidValidUntil {
        /// The Unix timestamp as received.
        received: u32,
    },
    /// The proposal description was empty.
    #[error("invalid description: {received}")]
    InvalidDescription {
        /// The description as received.
        received: String,
    },
    /// A chain selector was not found in the registry.
    #[error("invalid chain ID: {chain}")]
    InvalidChainId {
        /// The selector that failed to resolve.
        chain: ChainId,
    },
    /// A per-chain parameter was missing for a referenced chain.
    #[error("missing {parameter} for chain {chain}")]
    MissingChainDetails {
        /// The chain the parameter was missing for.
        chain: ChainId,
        /// The name of the missing parameter.
        parameter: String,
    },
    /// A caller-supplied on-chain snapshot had no entry for a required chain.
    #[error("missing chain client for chain {chain}")]
    MissingChainClient {
        /// The chain without a snapshot entry.
        chain: ChainId,
    },
    /// The proposal carried no chain metadata at all.
    #[error("no chain metadata")]
    NoChainMetadata,
    /// The proposal carried no transactions at all.
    #[error("no transactions")]
    NoTransactions,
    /// A timelock batch contained no operations.
    #[error("empty batch for chain {chain}")]
    EmptyBatch {
        /// The chain whose batch was empty.
        chain: ChainId,
    },
    /// A recovered signer is not part of the on-chain configuration.
    #[error(
        "invalid signature: received signature for address {recovered} is not a signer on MCMS {mcm_address} on chain {chain}"
    )]
    InvalidSignature {
        /// The chain whose configuration rejected the signer.
        chain: ChainId,
        /// The multisig contract the configuration was read from.
        mcm_address: Address,
        /// The address recovered from the offending signature.
        recovered: Address,
    },
    /// A signature byte string was not the expected 65 bytes.
    #[error("invalid signature length: {received_length}")]
    InvalidSignatureBytes {
        /// The length of the byte string as received.
        received_length: usize,
    },
    /// A signature was malformed or could not be recovered against a digest.
    #[error("signature recovery failed: {reason}")]
    SignatureRecovery {
        /// A description of the recovery failure.
        reason: String,
    },
    /// The recovered signer set does not satisfy a chain's quorum tree.
    #[error("quorum not met for chain {chain}")]
    QuorumNotMet {
        /// The chain whose quorum was not met.
        chain: ChainId,
    },
    /// A signer-group configuration violated a structural invariant.
    #[error("invalid MCMS config: {reason}")]
    InvalidMcmsConfig {
        /// The invariant that was violated.
        reason: String,
    },
    /// Two chains of one proposal carry differing signer configurations.
    #[error("inconsistent configs for chains {chain_a} and {chain_b}")]
    InconsistentConfigs {
        /// First chain of the mismatched pair.
        chain_a: ChainId,
        /// Second chain of the mismatched pair.
        chain_b: ChainId,
    },
    /// A timelock proposal named an unknown operation kind.
    #[error("invalid timelock operation: {received}")]
    InvalidTimelockOperation {
        /// The operation string as received.
        received: String,
    },
    /// A proposal file named an unknown proposal type.
    #[error("invalid proposal type: {received}")]
    InvalidProposalType {
        /// The proposal type string as received.
        received: String,
    },
    /// A schedule proposal carried an unparseable minimum delay.
    #[error("invalid min delay: {received}")]
    InvalidMinDelay {
        /// The delay string as received.
        received: String,
    },
    /// A proof was requested for a hash that is not part of the tree.
    #[error("merkle tree does not contain hash: {hash}")]
    MerkleNodeNotFound {
        /// The hash that was not found at some tree level.
        hash: B256,
    },
    /// An operation index was outside the proposal's operation list.
    #[error("operation index {index} out of range ({count} operations)")]
    InvalidOperationIndex {
        /// The requested index.
        index: usize,
        /// The number of operations in the proposal.
        count: usize,
    },
    /// A value did not fit the ABI type it was encoded as.
    #[error("abi value error: {reason}")]
    AbiValue {
        /// A description of the range or shape violation.
        reason: String,
    },
}

impl ErrorCode for McmsError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidVersion { .. } => "MCMS_INVALID_VERSION",
            Self::InvalidValidUntil { .. } => "MCMS_INVALID_VALID_UNTIL",
            Self::InvalidDescription { .. } => "MCMS_INVALID_DESCRIPTION",
            Self::InvalidChainId { .. } => "MCMS_INVALID_CHAIN_ID",
            Self::MissingChainDetails { .. } => "MCMS_MISSING_CHAIN_DETAILS",
            Self::MissingChainClient { .. } => "MCMS_MISSING_CHAIN_CLIENT",
            Self::NoChainMetadata => "MCMS_NO_CHAIN_METADATA",
            Self::NoTransactions => "MCMS_NO_TRANSACTIONS",
            Self::EmptyBatch { .. } => "MCMS_EMPTY_BATCH",
            Self::InvalidSignature { .. } => "MCMS_INVALID_SIGNATURE",
            Self::InvalidSignatureBytes { .. } => "MCMS_INVALID_SIGNATURE_BYTES",
            Self::SignatureRecovery { .. } => "MCMS_SIGNATURE_RECOVERY_FAILED",
            Self::QuorumNotMet { .. } => "MCMS_QUORUM_NOT_MET",
            Self::InvalidMcmsConfig { .. } => "MCMS_INVALID_CONFIG",
            Self::InconsistentConfigs { .. } => "MCMS_INCONSISTENT_CONFIGS",
            Self::InvalidTimelockOperation { .. } => "MCMS_INVALID_TIMELOCK_OPERATION",
            Self::InvalidProposalType { .. } => "MCMS_INVALID_PROPOSAL_TYPE",
            Self::InvalidMinDelay { .. } => "MCMS_INVALID_MIN_DELAY",
            Self::MerkleNodeNotFound { .. } => "MCMS_MERKLE_NODE_NOT_FOUND",
            Self::InvalidOperationIndex { .. } => "MCMS_INVALID_OPERATION_INDEX",
            Self::AbiValue { .. } => "MCMS_ABI_VALUE",
        }
    }
}
