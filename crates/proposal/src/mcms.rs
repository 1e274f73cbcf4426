//! The MCMS-only proposal model and its structural validation.

use crate::executor::Executor;
use alloy_primitives::{Address, Bytes, U256};
use mcms_crypto::Signature;
use mcms_types::chain::ChainId;
use mcms_types::error::McmsError;
use mcms_types::{wire, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-chain anchoring data for a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// The operation count the chain's multisig is expected to be at when
    /// the first operation of this proposal executes.
    pub starting_op_count: u64,
    /// The multisig contract address on this chain.
    pub mcm_address: Address,
}

/// One call to perform, minus its chain assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// The contract to call.
    pub to: Address,
    /// Calldata passed through verbatim.
    pub data: Bytes,
    /// Native value attached to the call.
    #[serde(with = "wire::u256_decimal")]
    pub value: U256,
    /// Descriptive label for signers; never enters any hash.
    pub contract_type: String,
    /// Descriptive labels for signers; never enter any hash.
    pub tags: Vec<String>,
}

/// An [`Operation`] pinned to a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOperation {
    /// The chain this operation executes on.
    #[serde(rename = "chainIdentifier")]
    pub chain_id: ChainId,
    /// The call itself.
    #[serde(flatten)]
    pub op: Operation,
}

/// A proposal whose transactions target MCMS-managed contracts directly.
///
/// The MCMS contract performs no call batching of its own, so each
/// transaction is one on-chain operation. The struct mirrors the shared
/// JSON wire format field for field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McmsProposal {
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
    /// Operations to be executed, in submission order.
    pub transactions: Vec<ChainOperation>,
}

impl McmsProposal {
    /// Constructs and validates a proposal.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: String,
        valid_until: u32,
        signatures: Vec<Signature>,
        override_previous_root: bool,
        chain_metadata: BTreeMap<ChainId, ChainMetadata>,
        description: String,
        transactions: Vec<ChainOperation>,
    ) -> Result<Self> {
        let proposal = McmsProposal {
            version,
            valid_until,
            signatures,
            override_previous_root,
            chain_metadata,
            description,
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
        if u64::from(self.valid_until) <= unix_now() {
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
        for transaction in &self.transactions {
            if !self.chain_metadata.contains_key(&transaction.chain_id) {
                return Err(McmsError::MissingChainDetails {
                    chain: transaction.chain_id,
                    parameter: "chain metadata".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Appends a collected signature.
    pub fn add_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    /// Assembles the executor for this proposal.
    pub fn to_executor(self, is_simulation: bool) -> Result<Executor> {
        Executor::new(self, is_simulation)
    }
}

/// Seconds since the Unix epoch; zero if the clock reads before it.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const TEST_CHAIN: ChainId = ChainId(3379446385462418246);

    fn operation(to: Address) -> ChainOperation {
        ChainOperation {
            chain_id: TEST_CHAIN,
            op: Operation {
                to,
                data: Bytes::from_static(b"data"),
                value: U256::ZERO,
                contract_type: String::new(),
                tags: vec![],
            },
        }
    }

    fn valid_proposal() -> McmsProposal {
        McmsProposal {
            version: "1.0".to_string(),
            valid_until: u32::MAX,
            signatures: vec![],
            override_previous_root: false,
            chain_metadata: BTreeMap::from([(
                TEST_CHAIN,
                ChainMetadata {
                    starting_op_count: 0,
                    mcm_address: address!("1234567890abcdef1234567890abcdef12345678"),
                },
            )]),
            description: "grant role".to_string(),
            transactions: vec![operation(address!(
                "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
            ))],
        }
    }

    #[test]
    fn accepts_a_well_formed_proposal() {
        assert!(valid_proposal().validate().is_ok());
    }

    #[test]
    fn rejects_empty_version() {
        let mut proposal = valid_proposal();
        proposal.version.clear();
        assert!(matches!(
            proposal.validate(),
            Err(McmsError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn rejects_expired_valid_until() {
        let mut proposal = valid_proposal();
        proposal.valid_until = 1;
        assert_eq!(
            proposal.validate(),
            Err(McmsError::InvalidValidUntil { received: 1 })
        );
    }

    #[test]
    fn rejects_missing_chain_metadata() {
        let mut proposal = valid_proposal();
        proposal.chain_metadata.clear();
        assert_eq!(proposal.validate(), Err(McmsError::NoChainMetadata));
    }

    #[test]
    fn rejects_empty_transactions() {
        let mut proposal = valid_proposal();
        proposal.transactions.clear();
        assert_eq!(proposal.validate(), Err(McmsError::NoTransactions));
    }

    #[test]
    fn rejects_empty_description() {
        let mut proposal = valid_proposal();
        proposal.description.clear();
        assert!(matches!(
            proposal.validate(),
            Err(McmsError::InvalidDescription { .. })
        ));
    }

    #[test]
    fn rejects_transaction_on_unlisted_chain() {
        let mut proposal = valid_proposal();
        if let Some(transaction) = proposal.transactions.first_mut() {
            transaction.chain_id = ChainId(999);
        }
        assert!(matches!(
            proposal.validate(),
            Err(McmsError::MissingChainDetails { chain, .. }) if chain == ChainId(999)
        ));
    }

    #[test]
    fn wire_format_field_names_are_stable() {
        let proposal = valid_proposal();
        let json = serde_json::to_value(&proposal).unwrap();

        for field in [
            "version",
            "validUntil",
            "signatures",
            "overridePreviousRoot",
            "chainMetadata",
            "description",
            "transactions",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }

        let metadata = json
            .get("chainMetadata")
            .and_then(|m| m.get(TEST_CHAIN.to_string()))
            .unwrap();
        assert!(metadata.get("startingOpCount").is_some());
        assert!(metadata.get("mcmAddress").is_some());

        let transaction = json
            .get("transactions")
            .and_then(|t| t.get(0))
            .unwrap();
        for field in ["chainIdentifier", "to", "value", "data", "contractType", "tags"] {
            assert!(transaction.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(transaction.get("value").unwrap(), "0");
        assert_eq!(transaction.get("data").unwrap(), "0x64617461");
    }

    #[test]
    fn wire_format_round_trips() {
        let proposal = valid_proposal();
        let json = serde_json::to_string(&proposal).unwrap();
        assert_eq!(
            serde_json::from_str::<McmsProposal>(&json).unwrap(),
            proposal
        );
    }
}
