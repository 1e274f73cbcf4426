//! Timelock batch proposals and their rewrite into the MCMS-only shape.
//!
//! Each batch becomes a single operation against the chain's RBAC timelock:
//! `scheduleBatch` to enqueue it after a delay, `cancel` to withdraw a
//! pending batch, or `bypasserExecuteBatch` to run it immediately. Batches on
//! one chain are linked through the timelock's operation id: every batch
//! names its predecessor, so scheduled work executes in proposal order.

use crate::executor::Executor;
use crate::mcms::{ChainMetadata, ChainOperation, McmsProposal, Operation};
use alloy_primitives::{keccak256, Address, B256, U256};
use mcms_crypto::abi::{self, Token};
use mcms_crypto::Signature;
use mcms_types::chain::ChainId;
use mcms_types::error::McmsError;
use mcms_types::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// The zero hash, used as the predecessor of a chain's first batch and as
/// the salt of every batch.
pub const ZERO_HASH: B256 = B256::ZERO;

const SCHEDULE_BATCH_SIGNATURE: &str =
    "scheduleBatch((address,uint256,bytes)[],bytes32,bytes32,uint256)";
const CANCEL_SIGNATURE: &str = "cancel(bytes32)";
const BYPASSER_EXECUTE_BATCH_SIGNATURE: &str = "bypasserExecuteBatch((address,uint256,bytes)[])";

/// The contract type tag stamped on rewritten operations.
const TIMELOCK_CONTRACT_TYPE: &str = "RBACTimelock";

/// How a timelock proposal drives the timelock contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelockOperation {
    /// Enqueue each batch behind the configured delay.
    Schedule,
    /// Withdraw a previously scheduled batch.
    Cancel,
    /// Execute each batch immediately through the bypasser role.
    Bypass,
}

impl fmt::Display for TimelockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelockOperation::Schedule => f.write_str("schedule"),
            TimelockOperation::Cancel => f.write_str("cancel"),
            TimelockOperation::Bypass => f.write_str("bypass"),
        }
    }
}

impl FromStr for TimelockOperation {
    type Err = McmsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "schedule" => Ok(TimelockOperation::Schedule),
            "cancel" => Ok(TimelockOperation::Cancel),
            "bypass" => Ok(TimelockOperation::Bypass),
            other => Err(McmsError::InvalidTimelockOperation {
                received: other.to_string(),
            }),
        }
    }
}

/// A batch of operations executed atomically on one chain's timelock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchChainOperation {
    /// The chain this batch executes on.
    #[serde(rename = "chainIdentifier")]
    pub chain_id: ChainId,
    /// The calls of the batch, in execution order. Never empty.
    pub batch: Vec<Operation>,
}

/// A proposal routed through per-chain RBAC timelocks.
///
/// Shares the MCMS proposal envelope but batches its transactions and names
/// the timelock contract of every chain it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelockProposal {
    /// Proposal format version, e.g. `"1.0"`.
    pub version: String,
    /// Unix timestamp after which the root may no longer be set.
    pub valid_until: u32,
    /// Signatures collected so far over the signing hash.
    pub signatures: Vec<Signature>,
    /// Whether installing this root may discard a partially executed one.
    pub override_previous_root: bool,
    /// Per-chain anchoring data; every referenced chain must have an entry.
    pub chain_metadata: BTreeMap<ChainId, ChainMetadata>,
    /// Shown to signers as-is to give them context for the change.
    pub description: String,
    /// How the batches drive the timelock.
    pub operation: TimelockOperation,
    /// Minimum delay for scheduled batches, e.g. `"3h"`. Ignored unless the
    /// operation is `schedule`.
    pub min_delay: String,
    /// The timelock contract per chain.
    pub timelock_addresses: BTreeMap<ChainId, Address>,
    /// The batches to be executed, in submission order.
    pub transactions: Vec<BatchChainOperation>,
}

impl TimelockProposal {
    /// Constructs and validates a proposal.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: String,
        valid_until: u32,
        signatures: Vec<Signature>,
        override_previous_root: bool,
        chain_metadata: BTreeMap<ChainId, ChainMetadata>,
        timelock_addresses: BTreeMap<ChainId, Address>,
        description: String,
        transactions: Vec<BatchChainOperation>,
        operation: TimelockOperation,
        min_delay: String,
    ) -> Result<Self> {
        let proposal = TimelockProposal {
            version,
            valid_until,
            signatures,
            override_previous_root,
            chain_metadata,
            description,
            operation,
            min_delay,
            timelock_addresses,
            transactions,
        };
        proposal.validate()?;
        Ok(proposal)
    }

    /// Checks the structural invariants of the proposal.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(McmsError::InvalidVersion {
                received: self.version.clone(),
            });
        }
        if u64::from(self.valid_until) <= crate::mcms::unix_now() {
            return Err(McmsError::InvalidValidUntil {
                received: self.valid_until,
            });
        }
        if self.chain_metadata.is_empty() {
            return Err(McmsError::NoChainMetadata);
        }
        if self.transactions.is_empty() {
            return Err(McmsError::NoTransactions);
        }
        if self.description.is_empty() {
            return Err(McmsError::InvalidDescription {
                received: self.description.clone(),
            });
        }
        for batch_operation in &self.transactions {
            if !self.chain_metadata.contains_key(&batch_operation.chain_id) {
                return Err(McmsError::MissingChainDetails {
                    chain: batch_operation.chain_id,
                    parameter: "chain metadata".to_string(),
                });
            }
            if batch_operation.batch.is_empty() {
                return Err(McmsError::EmptyBatch {
                    chain: batch_operation.chain_id,
                });
            }
        }

        // The delay only gates scheduling; cancel and bypass ignore it.
        if self.operation == TimelockOperation::Schedule {
            self.parse_min_delay()?;
        }
        Ok(())
    }

    /// Appends a collected signature.
    pub fn add_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    fn parse_min_delay(&self) -> Result<Duration> {
        humantime::parse_duration(&self.min_delay).map_err(|_| McmsError::InvalidMinDelay {
            received: self.min_delay.clone(),
        })
    }

    /// Rewrites the proposal into an equivalent MCMS-only proposal.
    ///
    /// Each batch collapses into one operation targeting the chain's
    /// timelock. The per-chain predecessor starts at [`ZERO_HASH`] and
    /// advances to the batch's operation id after every batch, whatever the
    /// operation kind, so later scheduled batches keep their ordering even
    /// across interleaved cancels.
    pub fn to_mcms_proposal(&self) -> Result<McmsProposal> {
        let delay = match self.operation {
            TimelockOperation::Schedule => self.parse_min_delay()?,
            _ => Duration::ZERO,
        };

        let mut predecessors: BTreeMap<ChainId, B256> = self
            .chain_metadata
            .keys()
            .map(|chain| (*chain, ZERO_HASH))
            .collect();

        let mut transactions = Vec::with_capacity(self.transactions.len());
        for batch_operation in &self.transactions {
            let chain = batch_operation.chain_id;
            let timelock = *self.timelock_addresses.get(&chain).ok_or_else(|| {
                McmsError::MissingChainDetails {
                    chain,
                    parameter: "timelock address".to_string(),
                }
            })?;

            let calls: Vec<Token> = batch_operation
                .batch
                .iter()
                .map(|operation| {
                    Token::Tuple(vec![
                        Token::Address(operation.to),
                        Token::Uint(operation.value, 256),
                        Token::Bytes(operation.data.to_vec()),
                    ])
                })
                .collect();
            let tags: Vec<String> = batch_operation
                .batch
                .iter()
                .flat_map(|operation| operation.tags.iter().cloned())
                .collect();

            let predecessor = predecessors.get(&chain).copied().unwrap_or(ZERO_HASH);
            let operation_id = hash_operation_batch(&calls, predecessor, ZERO_HASH)?;

            let data = match self.operation {
                TimelockOperation::Schedule => abi::encode_call(
                    SCHEDULE_BATCH_SIGNATURE,
                    &[
                        Token::Array(calls),
                        Token::FixedBytes(predecessor),
                        Token::FixedBytes(ZERO_HASH),
                        Token::Uint(U256::from(delay.as_secs()), 256),
                    ],
                )?,
                TimelockOperation::Cancel => {
                    abi::encode_call(CANCEL_SIGNATURE, &[Token::FixedBytes(operation_id)])?
                }
                TimelockOperation::Bypass => abi::encode_call(
                    BYPASSER_EXECUTE_BATCH_SIGNATURE,
                    &[Token::Array(calls)],
                )?,
            };

            transactions.push(ChainOperation {
                chain_id: chain,
                op: Operation {
                    to: timelock,
                    data: data.into(),
                    value: U256::ZERO,
                    contract_type: TIMELOCK_CONTRACT_TYPE.to_string(),
                    tags,
                },
            });

            predecessors.insert(chain, operation_id);
        }

        debug!(
            operation = %self.operation,
            batches = self.transactions.len(),
            "rewrote timelock proposal into MCMS-only form"
        );

        Ok(McmsProposal {
            version: self.version.clone(),
            valid_until: self.valid_until,
            signatures: self.signatures.clone(),
            override_previous_root: self.override_previous_root,
            chain_metadata: self.chain_metadata.clone(),
            description: self.description.clone(),
            transactions,
        })
    }

    /// Rewrites the proposal and assembles the executor in one step.
    pub fn to_executor(&self, is_simulation: bool) -> Result<Executor> {
        self.to_mcms_proposal()?.to_executor(is_simulation)
    }
}

/// Computes the timelock's operation id for a batch of calls:
/// `keccak256(abi.encode(calls, predecessor, salt))`, replicating the
/// contract's `hashOperationBatch`.
pub fn hash_operation_batch(calls: &[Token], predecessor: B256, salt: B256) -> Result<B256> {
    let encoded = abi::encode(&[
        Token::Array(calls.to_vec()),
        Token::FixedBytes(predecessor),
        Token::FixedBytes(salt),
    ])?;
    Ok(keccak256(encoded))
}
