#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! # MCMS Signer Configuration
//!
//! The multisig contract stores its signer hierarchy as two flat 32-slot
//! arrays (group quorums and group parents) plus a sorted signer list tagged
//! with group indices. This crate converts between that raw form and a tree
//! of owned subgroups, validates the structural invariants the contract
//! enforces, and evaluates hierarchical quorums over recovered signer sets.

use alloy_primitives::Address;
use mcms_types::error::McmsError;
use mcms_types::Result;
use serde::{Deserialize, Serialize};

/// The contract caps any configuration at 32 groups, root included.
pub const MAX_GROUPS: usize = 32;

/// One signer slot of the raw on-chain configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSigner {
    /// The signer's account address.
    pub addr: Address,
    /// Position within the flattened, address-sorted signer list.
    pub index: u8,
    /// Index of the group this signer belongs to.
    pub group: u8,
}

/// The raw configuration exactly as `getConfig` returns it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawConfig {
    /// Quorum per group slot; zero marks an unused slot.
    pub group_quorums: [u8; MAX_GROUPS],
    /// Parent group index per slot; the root's entry is zero.
    pub group_parents: [u8; MAX_GROUPS],
    /// Flattened signer list, sorted ascending by address.
    pub signers: Vec<RawSigner>,
}

/// A signer group: a quorum over direct signers and nested subgroups.
///
/// The root group is the whole configuration. A group is satisfied when its
/// matched direct signers plus its satisfied subgroups reach the quorum.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Approvals required from this group's direct signers and subgroups.
    pub quorum: u8,
    /// Direct signer addresses.
    pub signers: Vec<Address>,
    /// Nested subgroups, each counting as one approval when satisfied.
    pub group_signers: Vec<Config>,
}

impl Config {
    /// Constructs and validates a configuration.
    pub fn new(quorum: u8, signers: Vec<Address>, group_signers: Vec<Config>) -> Result<Self> {
        let config = Config {
            quorum,
            signers,
            group_signers,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rebuilds the group tree from the raw on-chain form.
    ///
    /// Group slots with a zero quorum are unused. Children are resolved
    /// fully before being attached to their parent, so arbitrarily deep
    /// nesting reconstructs correctly. The returned config is group 0.
    pub fn from_raw(raw: &RawConfig) -> Result<Self> {
        let mut signer_lists: Vec<Vec<Address>> = vec![Vec::new(); MAX_GROUPS];
        for signer in &raw.signers {
            let list = signer_lists.get_mut(usize::from(signer.group)).ok_or_else(|| {
                McmsError::InvalidMcmsConfig {
                    reason: format!("signer group index out of range: {}", signer.group),
                }
            })?;
            list.push(signer.addr);
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); MAX_GROUPS];
        for (index, quorum) in raw.group_quorums.iter().enumerate().skip(1) {
            if *quorum == 0 {
                continue;
            }
            let parent = usize::from(
                *raw.group_parents
                    .get(index)
                    .ok_or_else(|| McmsError::InvalidMcmsConfig {
                        reason: "group parents array too short".to_string(),
                    })?,
            );
            if parent >= index {
                return Err(McmsError::InvalidMcmsConfig {
                    reason: format!("group {index} has a non-ancestor parent {parent}"),
                });
            }
            children
                .get_mut(parent)
                .ok_or_else(|| McmsError::InvalidMcmsConfig {
                    reason: format!("group parent index out of range: {parent}"),
                })?
                .push(index);
        }

        Ok(Self::assemble(0, raw, &signer_lists, &children))
    }

    fn assemble(
        index: usize,
        raw: &RawConfig,
        signer_lists: &[Vec<Address>],
        children: &[Vec<usize>],
    ) -> Self {
        let group_signers = children
            .get(index)
            .into_iter()
            .flatten()
            .map(|child| Self::assemble(*child, raw, signer_lists, children))
            .collect();
        Config {
            quorum: raw.group_quorums.get(index).copied().unwrap_or(0),
            signers: signer_lists.get(index).cloned().unwrap_or_default(),
            group_signers,
        }
    }

    /// Enforces the structural invariants the contract checks on `setConfig`.
    pub fn validate(&self) -> Result<()> {
        if self.quorum == 0 {
            return Err(McmsError::InvalidMcmsConfig {
                reason: "quorum must be greater than 0".to_string(),
            });
        }
        if self.signers.is_empty() && self.group_signers.is_empty() {
            return Err(McmsError::InvalidMcmsConfig {
                reason: "config must have at least one signer or group".to_string(),
            });
        }
        if self.signers.len() + self.group_signers.len() < usize::from(self.quorum) {
            return Err(McmsError::InvalidMcmsConfig {
                reason: "quorum must be less than or equal to the number of signers and groups"
                    .to_string(),
            });
        }
        if self.group_count() > MAX_GROUPS {
            return Err(McmsError::InvalidMcmsConfig {
                reason: format!("a config flattens to at most {MAX_GROUPS} groups"),
            });
        }
        for group in &self.group_signers {
            group.validate()?;
        }
        Ok(())
    }

    fn group_count(&self) -> usize {
        1 + self
            .group_signers
            .iter()
            .map(Config::group_count)
            .sum::<usize>()
    }

    /// Converts back to the raw on-chain form.
    pub fn to_raw(&self) -> Result<RawConfig> {
        let (group_quorums, group_parents, addresses, groups) = self.extract_set_config_inputs()?;
        let signers = addresses
            .iter()
            .zip(groups.iter())
            .enumerate()
            .map(|(index, (addr, group))| RawSigner {
                addr: *addr,
                index: index as u8,
                group: *group,
            })
            .collect();
        Ok(RawConfig {
            group_quorums,
            group_parents,
            signers,
        })
    }

    /// Flattens the tree into the `setConfig` argument lists: zero-padded
    /// quorum and parent arrays plus the signer addresses with their group
    /// tags, sorted strictly ascending by address.
    pub fn extract_set_config_inputs(
        &self,
    ) -> Result<([u8; MAX_GROUPS], [u8; MAX_GROUPS], Vec<Address>, Vec<u8>)> {
        let mut quorums = Vec::new();
        let mut parents = Vec::new();
        let mut signers: Vec<(Address, usize)> = Vec::new();
        self.extract_groups_and_signers(0, &mut quorums, &mut parents, &mut signers);

        if quorums.len() > MAX_GROUPS {
            return Err(McmsError::InvalidMcmsConfig {
                reason: format!("a config flattens to at most {MAX_GROUPS} groups"),
            });
        }

        let mut group_quorums = [0u8; MAX_GROUPS];
        let mut group_parents = [0u8; MAX_GROUPS];
        for (slot, quorum) in group_quorums.iter_mut().zip(quorums.iter()) {
            *slot = *quorum;
        }
        for (slot, parent) in group_parents.iter_mut().zip(parents.iter()) {
            *slot = *parent as u8;
        }

        // The contract rejects signer lists that are not strictly increasing.
        signers.sort_by(|a, b| a.0.cmp(&b.0));
        for window in signers.windows(2) {
            if let [left, right] = window {
                if left.0 == right.0 {
                    return Err(McmsError::InvalidMcmsConfig {
                        reason: format!("duplicate signer address: {}", left.0),
                    });
                }
            }
        }

        let addresses = signers.iter().map(|(addr, _)| *addr).collect();
        let groups = signers.iter().map(|(_, group)| *group as u8).collect();
        Ok((group_quorums, group_parents, addresses, groups))
    }

    fn extract_groups_and_signers(
        &self,
        parent_index: usize,
        quorums: &mut Vec<u8>,
        parents: &mut Vec<usize>,
        signers: &mut Vec<(Address, usize)>,
    ) {
        quorums.push(self.quorum);
        parents.push(parent_index);
        let current = quorums.len() - 1;

        for signer in &self.signers {
            signers.push((*signer, current));
        }
        for group in &self.group_signers {
            group.extract_groups_and_signers(current, quorums, parents, signers);
        }
    }

    /// Collects every signer address in the tree.
    pub fn all_signers(&self) -> Vec<Address> {
        let mut addresses = self.signers.clone();
        for group in &self.group_signers {
            addresses.extend(group.all_signers());
        }
        addresses
    }

    /// Evaluates this group against a set of recovered signer addresses.
    ///
    /// A group is at consensus when its matched direct signers plus its
    /// satisfied subgroups reach the quorum. An address satisfies at most
    /// one direct-signer slot since signers are matched, not counted.
    pub fn is_group_at_consensus(&self, recovered: &[Address]) -> bool {
        let direct = self
            .signers
            .iter()
            .filter(|signer| recovered.contains(signer))
            .count();
        let satisfied_groups = self
            .group_signers
            .iter()
            .filter(|group| group.is_group_at_consensus(recovered))
            .count();
        direct + satisfied_groups >= usize::from(self.quorum)
    }
}

/// Structural, order-independent equality: quorums match, signer multisets
/// match, and every subgroup has a structurally equal counterpart.
impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        if self.quorum != other.quorum
            || self.signers.len() != other.signers.len()
            || self.group_signers.len() != other.group_signers.len()
        {
            return false;
        }

        let mut ours = self.signers.clone();
        let mut theirs = other.signers.clone();
        ours.sort();
        theirs.sort();
        if ours != theirs {
            return false;
        }

        let mut unmatched: Vec<&Config> = other.group_signers.iter().collect();
        for group in &self.group_signers {
            match unmatched.iter().position(|candidate| *candidate == group) {
                Some(found) => {
                    unmatched.swap_remove(found);
                }
                None => return false,
            }
        }
        true
    }
}

impl Eq for Config {}
