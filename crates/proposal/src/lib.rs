#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! # MCMS Proposal Pipeline
//!
//! The deterministic core of the MCMS toolkit: a validated proposal is
//! turned into an [`Executor`] holding the Merkle tree over every per-chain
//! metadata and operation leaf, from which callers derive the signing hash,
//! Merkle proofs, and the set-root / execute argument bundles submitted by
//! collaborators. Timelock batch proposals are first rewritten into the
//! MCMS-only shape by [`timelock::TimelockProposal::to_mcms_proposal`].
//!
//! Everything here is a pure transformation: on-chain state (operation
//! counts, signer configurations) enters as caller-supplied snapshots, never
//! as a live backend.

use mcms_crypto::Signature;
use mcms_types::error::McmsError;
use mcms_types::Result;
use std::fmt;
use std::str::FromStr;

pub mod encoding;
pub mod executor;
pub mod mcms;
pub mod timelock;

pub use encoding::{Op, RootMetadata};
pub use executor::{ExecuteArgs, Executor, SetRootArgs};
pub use mcms::{ChainMetadata, ChainOperation, McmsProposal, Operation};
pub use timelock::{BatchChainOperation, TimelockOperation, TimelockProposal};

/// The two proposal shapes, as one tagged variant.
///
/// Rewriting a timelock proposal yields the [`Proposal::Mcms`] arm; executor
/// construction goes through it either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// A plain proposal whose operations target MCMS-managed contracts.
    Mcms(McmsProposal),
    /// A batch proposal routed through a chain-local RBAC timelock.
    McmsWithTimelock(TimelockProposal),
}

impl Proposal {
    /// Runs the structural validation of the underlying shape.
    pub fn validate(&self) -> Result<()> {
        match self {
            Proposal::Mcms(proposal) => proposal.validate(),
            Proposal::McmsWithTimelock(proposal) => proposal.validate(),
        }
    }

    /// Appends a signature to the underlying proposal.
    pub fn add_signature(&mut self, signature: Signature) {
        match self {
            Proposal::Mcms(proposal) => proposal.add_signature(signature),
            Proposal::McmsWithTimelock(proposal) => proposal.add_signature(signature),
        }
    }

    /// Builds the executor, rewriting timelock batches first when needed.
    pub fn to_executor(self, is_simulation: bool) -> Result<Executor> {
        match self {
            Proposal::Mcms(proposal) => proposal.to_executor(is_simulation),
            Proposal::McmsWithTimelock(proposal) => proposal.to_executor(is_simulation),
        }
    }
}

/// String tags collaborators use to dispatch proposal files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalKind {
    /// `"MCMS"`
    Mcms,
    /// `"MCMSWithTimelock"`
    McmsWithTimelock,
}

impl FromStr for ProposalKind {
    type Err = McmsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "MCMS" => Ok(ProposalKind::Mcms),
            "MCMSWithTimelock" => Ok(ProposalKind::McmsWithTimelock),
            other => Err(McmsError::InvalidProposalType {
                received: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalKind::Mcms => f.write_str("MCMS"),
            ProposalKind::McmsWithTimelock => f.write_str("MCMSWithTimelock"),
        }
    }
}
