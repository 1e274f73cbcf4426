//! End-to-end pipeline tests: executor assembly, signing, quorum
//! verification, and the submission payloads.

mod common;

use alloy_primitives::{Address, U256};
use common::*;
use mcms_proposal::encoding::{hash_metadata_leaf, hash_op_leaf};
use mcms_merkle::verify_proof;
use mcms_types::chain::ChainId;
use mcms_types::error::McmsError;
use std::collections::BTreeMap;

#[test]
fn single_operation_payloads_verify_against_the_root() {
    let executor = single_chain_proposal().to_executor(true).unwrap();

    let metadata = executor.root_metadatas.get(&TEST_CHAIN_1).unwrap();
    assert_eq!(metadata.pre_op_count, 0);
    assert_eq!(metadata.post_op_count, 1);

    let set_root = executor.set_root_args(TEST_CHAIN_1).unwrap();
    assert_eq!(set_root.root, executor.tree.root);
    let metadata_leaf = hash_metadata_leaf(&set_root.metadata).unwrap();
    assert!(verify_proof(
        metadata_leaf,
        &set_root.metadata_proof,
        set_root.root
    ));

    let execute = executor.execute_args(0).unwrap();
    assert_eq!(execute.op.nonce, 0);
    let op_leaf = hash_op_leaf(&execute.op).unwrap();
    assert!(verify_proof(op_leaf, &execute.proof, set_root.root));
}

#[test]
fn tagged_proposal_dispatches_to_the_mcms_arm() {
    let mut tagged = mcms_proposal::Proposal::Mcms(single_chain_proposal());
    tagged.validate().unwrap();

    let key = signer(0x01);
    let hash = match &tagged {
        mcms_proposal::Proposal::Mcms(inner) => inner
            .clone()
            .to_executor(true)
            .unwrap()
            .signing_hash()
            .unwrap(),
        _ => unreachable!(),
    };
    tagged.add_signature(sign(&key, hash));

    let executor = tagged.to_executor(true).unwrap();
    assert_eq!(executor.proposal.signatures.len(), 1);
}

#[test]
fn out_of_range_operation_index_is_rejected() {
    let executor = single_chain_proposal().to_executor(true).unwrap();
    assert_eq!(
        executor.execute_args(1).unwrap_err(),
        McmsError::InvalidOperationIndex { index: 1, count: 1 }
    );
}

#[test]
fn quorum_of_three_needs_all_three_signatures() {
    let keys = [signer(0x01), signer(0x02), signer(0x03)];
    let addresses: Vec<Address> = keys.iter().map(signer_address).collect();
    let configs = BTreeMap::from([(TEST_CHAIN_1, flat_raw_config(3, &addresses))]);

    let mut proposal = single_chain_proposal();
    let hash = proposal.clone().to_executor(true).unwrap().signing_hash().unwrap();
    for key in &keys {
        proposal.add_signature(sign(key, hash));
    }

    let executor = proposal.to_executor(true).unwrap();
    assert!(executor.validate_signatures(&configs).unwrap());
    assert!(executor
        .check_quorum(TEST_CHAIN_1, configs.get(&TEST_CHAIN_1).unwrap())
        .unwrap());
}

#[test]
fn missing_signature_fails_quorum() {
    let keys = [signer(0x01), signer(0x02), signer(0x03)];
    let addresses: Vec<Address> = keys.iter().map(signer_address).collect();
    let configs = BTreeMap::from([(TEST_CHAIN_1, flat_raw_config(3, &addresses))]);

    let mut proposal = single_chain_proposal();
    let hash = proposal.clone().to_executor(true).unwrap().signing_hash().unwrap();
    for key in keys.iter().take(2) {
        proposal.add_signature(sign(key, hash));
    }

    let executor = proposal.to_executor(true).unwrap();
    assert_eq!(
        executor.validate_signatures(&configs).unwrap_err(),
        McmsError::QuorumNotMet { chain: TEST_CHAIN_1 }
    );
}

#[test]
fn unknown_signer_is_rejected_before_quorum() {
    let keys = [signer(0x01), signer(0x02), signer(0x03)];
    let addresses: Vec<Address> = keys.iter().map(signer_address).collect();
    let configs = BTreeMap::from([(TEST_CHAIN_1, flat_raw_config(3, &addresses))]);

    let outsider = signer(0x0f);
    let mut proposal = single_chain_proposal();
    let hash = proposal.clone().to_executor(true).unwrap().signing_hash().unwrap();
    proposal.add_signature(sign(&keys[0], hash));
    proposal.add_signature(sign(&keys[1], hash));
    proposal.add_signature(sign(&outsider, hash));

    let executor = proposal.to_executor(true).unwrap();
    let err = executor.validate_signatures(&configs).unwrap_err();
    assert_eq!(
        err,
        McmsError::InvalidSignature {
            chain: TEST_CHAIN_1,
            mcm_address: MCM_ADDRESS,
            recovered: signer_address(&outsider),
        }
    );
}

#[test]
fn set_root_signatures_are_sorted_by_recovered_address() {
    let keys = [signer(0x04), signer(0x01), signer(0x03), signer(0x02)];

    let mut proposal = single_chain_proposal();
    let hash = proposal.clone().to_executor(true).unwrap().signing_hash().unwrap();
    for key in &keys {
        proposal.add_signature(sign(key, hash));
    }

    let executor = proposal.to_executor(true).unwrap();
    let set_root = executor.set_root_args(TEST_CHAIN_1).unwrap();
    let recovered: Vec<Address> = set_root
        .signatures
        .iter()
        .map(|signature| signature.recover(hash).unwrap())
        .collect();

    assert!(recovered.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(set_root
        .signatures
        .iter()
        .all(|signature| signature.v == 27 || signature.v == 28));
}

#[test]
fn signing_hash_binds_root_and_expiry() {
    let base = single_chain_proposal().to_executor(true).unwrap();

    let mut later = single_chain_proposal();
    later.valid_until -= 1;
    let later = later.to_executor(true).unwrap();
    assert_ne!(base.signing_hash().unwrap(), later.signing_hash().unwrap());

    let mut different_root = single_chain_proposal();
    if let Some(transaction) = different_root.transactions.first_mut() {
        transaction.op.value = U256::from(1u64);
    }
    let different_root = different_root.to_executor(true).unwrap();
    assert_ne!(base.tree.root, different_root.tree.root);
    assert_ne!(
        base.signing_hash().unwrap(),
        different_root.signing_hash().unwrap()
    );
}

#[test]
fn simulation_forces_every_metadata_chain_id_to_1337() {
    let mut proposal = single_chain_proposal();
    proposal
        .chain_metadata
        .insert(TEST_CHAIN_2, metadata(0));
    proposal.transactions.push(chain_operation(
        TEST_CHAIN_2,
        Address::repeat_byte(0x0c),
        b"payload",
    ));

    let simulated = proposal.clone().to_executor(true).unwrap();
    for root_metadata in simulated.root_metadatas.values() {
        assert_eq!(root_metadata.chain_id, U256::from(1337u64));
    }

    let live = proposal.to_executor(false).unwrap();
    assert_eq!(
        live.root_metadatas.get(&TEST_CHAIN_2).unwrap().chain_id,
        U256::from(11155111u64)
    );
}

#[test]
fn nonces_are_dense_per_chain_and_order_preserving() {
    let mut proposal = single_chain_proposal();
    proposal.chain_metadata.insert(TEST_CHAIN_2, metadata(4));
    proposal.transactions = vec![
        chain_operation(TEST_CHAIN_1, Address::repeat_byte(0x01), b"a"),
        chain_operation(TEST_CHAIN_2, Address::repeat_byte(0x02), b"b"),
        chain_operation(TEST_CHAIN_1, Address::repeat_byte(0x03), b"c"),
        chain_operation(TEST_CHAIN_2, Address::repeat_byte(0x04), b"d"),
    ];

    let executor = proposal.to_executor(true).unwrap();

    let nonces: Vec<u64> = executor.chain_agnostic_ops.iter().map(|op| op.nonce).collect();
    assert_eq!(nonces, vec![0, 4, 1, 5]);

    // The flat list corresponds one-to-one to the proposal's transactions.
    for (op, transaction) in executor
        .chain_agnostic_ops
        .iter()
        .zip(executor.proposal.transactions.iter())
    {
        assert_eq!(op.to, transaction.op.to);
        assert_eq!(op.data, transaction.op.data);
    }
}

#[test]
fn every_operation_proof_verifies() {
    let mut proposal = single_chain_proposal();
    proposal.chain_metadata.insert(TEST_CHAIN_2, metadata(0));
    proposal.transactions = vec![
        chain_operation(TEST_CHAIN_1, Address::repeat_byte(0x01), b"a"),
        chain_operation(TEST_CHAIN_2, Address::repeat_byte(0x02), b"b"),
        chain_operation(TEST_CHAIN_1, Address::repeat_byte(0x03), b"c"),
    ];

    let executor = proposal.to_executor(true).unwrap();
    for index in 0..executor.chain_agnostic_ops.len() {
        let execute = executor.execute_args(index).unwrap();
        let leaf = hash_op_leaf(&execute.op).unwrap();
        assert!(verify_proof(leaf, &execute.proof, executor.tree.root));
    }
}

#[test]
fn mismatched_configs_across_chains_are_rejected() {
    let keys = [signer(0x01), signer(0x02)];
    let addresses: Vec<Address> = keys.iter().map(signer_address).collect();

    let mut proposal = single_chain_proposal();
    proposal.chain_metadata.insert(TEST_CHAIN_2, metadata(0));
    proposal.transactions.push(chain_operation(
        TEST_CHAIN_2,
        Address::repeat_byte(0x0c),
        b"payload",
    ));
    let executor = proposal.to_executor(true).unwrap();

    let matching = BTreeMap::from([
        (TEST_CHAIN_1, flat_raw_config(2, &addresses)),
        (TEST_CHAIN_2, flat_raw_config(2, &addresses)),
    ]);
    assert!(executor.validate_consistent_configs(&matching).is_ok());

    let mismatched = BTreeMap::from([
        (TEST_CHAIN_1, flat_raw_config(2, &addresses)),
        (TEST_CHAIN_2, flat_raw_config(1, &addresses)),
    ]);
    assert!(matches!(
        executor.validate_consistent_configs(&mismatched),
        Err(McmsError::InconsistentConfigs { .. })
    ));
}

#[test]
fn missing_snapshot_entry_is_surfaced() {
    let executor = single_chain_proposal().to_executor(true).unwrap();
    let configs: BTreeMap<ChainId, _> = BTreeMap::new();
    assert_eq!(
        executor.validate_signatures(&configs).unwrap_err(),
        McmsError::MissingChainClient { chain: TEST_CHAIN_1 }
    );
}
