//! Keccak-256 helpers shared by the encoding pipeline.

use alloy_primitives::{keccak256, B256};

/// Prefix applied by EIP-191 personal-message signing over a 32-byte payload.
const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Applies the EIP-191 prefix to a 32-byte message and hashes the result.
///
/// This matches what signing backends produce when asked to sign a personal
/// message, so a raw-key signature over this hash verifies on chain.
pub fn to_eth_signed_message_hash(message: B256) -> B256 {
    let mut data = Vec::with_capacity(EIP191_PREFIX.len() + message.len());
    data.extend_from_slice(EIP191_PREFIX);
    data.extend_from_slice(message.as_slice());
    keccak256(data)
}
