#![allow(dead_code)]

//! Shared fixtures: deterministic signers and minimal proposals.

use alloy_primitives::{address, Address, Bytes, B256, U256};
use k256::ecdsa::SigningKey;
use mcms_config::{Config, RawConfig};
use mcms_crypto::signature::address_of;
use mcms_crypto::Signature;
use mcms_proposal::{ChainMetadata, ChainOperation, McmsProposal, Operation};
use mcms_types::chain::ChainId;
use std::collections::BTreeMap;

pub const TEST_CHAIN_1: ChainId = ChainId(3379446385462418246);
pub const TEST_CHAIN_2: ChainId = ChainId(16015286601757825753);

pub const MCM_ADDRESS: Address = Address::repeat_byte(0x5a);
pub const TIMELOCK_ADDRESS: Address = Address::repeat_byte(0x7b);

pub fn signer(fill: u8) -> SigningKey {
    SigningKey::from_slice(&[fill; 32]).unwrap()
}

pub fn signer_address(key: &SigningKey) -> Address {
    address_of(key.verifying_key())
}

pub fn sign(key: &SigningKey, digest: B256) -> Signature {
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
    let (r_bytes, s_bytes) = signature.split_bytes();
    Signature {
        r: B256::from_slice(&r_bytes),
        s: B256::from_slice(&s_bytes),
        v: recovery_id.to_byte(),
    }
}

pub fn chain_operation(chain_id: ChainId, to: Address, data: &'static [u8]) -> ChainOperation {
    ChainOperation {
        chain_id,
        op: Operation {
            to,
            data: Bytes::from_static(data),
            value: U256::ZERO,
            contract_type: "ManyChainMultiSig".to_string(),
            tags: vec![],
        },
    }
}

pub fn metadata(starting_op_count: u64) -> ChainMetadata {
    ChainMetadata {
        starting_op_count,
        mcm_address: MCM_ADDRESS,
    }
}

/// One grant-role style operation on the simulated test chain.
pub fn single_chain_proposal() -> McmsProposal {
    McmsProposal {
        version: "1.0".to_string(),
        valid_until: u32::MAX,
        signatures: vec![],
        override_previous_root: true,
        chain_metadata: BTreeMap::from([(TEST_CHAIN_1, metadata(0))]),
        description: "grant proposer role to the multisig".to_string(),
        transactions: vec![chain_operation(
            TEST_CHAIN_1,
            address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            b"grantRole(PROPOSER, mcm)",
        )],
    }
}

/// A flat signer configuration in the raw on-chain form.
pub fn flat_raw_config(quorum: u8, addresses: &[Address]) -> RawConfig {
    Config::new(quorum, addresses.to_vec(), vec![])
        .unwrap()
        .to_raw()
        .unwrap()
}
