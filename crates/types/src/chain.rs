//! Chain identifiers and the registry mapping them to EVM-level chain ids.
//!
//! Proposals key their maps by a registry selector rather than by the EVM
//! chain id itself, so renamed or replayed networks keep a stable identity.
//! Only the EVM chain id ever enters an encoded leaf.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The chain id every simulated backend reports for `block.chainid`.
///
/// Root metadata destined for a simulated chain must carry this value or the
/// verifier contract rejects it with a wrong-chain error.
pub const SIMULATED_EVM_CHAIN_ID: u64 = 1337;

/// Opaque registry selector identifying one chain across the toolkit.
///
/// Selectors key every per-chain map in a proposal. They are resolved to an
/// EVM chain id through [`chain_by_selector`] when leaves are encoded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ChainId(
    /// The raw selector value.
    pub u64,
);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// One entry of the chain registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// Human-readable network name.
    pub name: &'static str,
    /// The chain id reported by `block.chainid` on this network.
    pub evm_chain_id: u64,
    /// The registry selector keying proposal maps.
    pub selector: u64,
}

/// Networks known to the toolkit.
///
/// The table mirrors the selector registry shared with the other MCMS
/// tools; collaborators extending it must keep selectors unique.
const REGISTRY: &[ChainInfo] = &[
    ChainInfo {
        name: "ethereum-mainnet",
        evm_chain_id: 1,
        selector: 5009297550715157269,
    },
    ChainInfo {
        name: "ethereum-testnet-sepolia",
        evm_chain_id: 11155111,
        selector: 16015286601757825753,
    },
    ChainInfo {
        name: "geth-testnet",
        evm_chain_id: 1337,
        selector: 3379446385462418246,
    },
    ChainInfo {
        name: "geth-testnet-2",
        evm_chain_id: 2337,
        selector: 10344971235874465080,
    },
];

/// Looks up a chain by its registry selector.
pub fn chain_by_selector(id: ChainId) -> Option<&'static ChainInfo> {
    REGISTRY.iter().find(|info| info.selector == id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_selectors() {
        let sepolia = chain_by_selector(ChainId(16015286601757825753)).unwrap();
        assert_eq!(sepolia.evm_chain_id, 11155111);

        let geth = chain_by_selector(ChainId(3379446385462418246)).unwrap();
        assert_eq!(geth.evm_chain_id, 1337);
    }

    #[test]
    fn unknown_selector_is_absent() {
        assert!(chain_by_selector(ChainId(42)).is_none());
    }

    #[test]
    fn chain_id_serializes_transparently() {
        let id = ChainId(3379446385462418246);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "3379446385462418246"
        );
    }
}
