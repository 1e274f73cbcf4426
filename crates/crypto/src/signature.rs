//! The 65-byte `(r, s, v)` ECDSA signature primitive.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use mcms_types::error::McmsError;
use mcms_types::Result;
use serde::{Deserialize, Serialize};

/// Length of the wire form `r || s || v`.
pub const SIGNATURE_LENGTH: usize = 65;

/// An ECDSA signature in the split form carried by proposal files.
///
/// `v` is stored as received; [`Signature::to_wire`] lifts it into the
/// {27, 28} range the verifier contract expects, and [`Signature::recover`]
/// reduces legacy values back to a {0, 1} recovery id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The 32-byte `r` scalar.
    #[serde(rename = "R")]
    pub r: B256,
    /// The 32-byte `s` scalar.
    #[serde(rename = "S")]
    pub s: B256,
    /// The recovery id, either raw {0, 1} or legacy {27, 28}.
    #[serde(rename = "V")]
    pub v: u8,
}

impl Signature {
    /// Splits a 65-byte `r || s || v` string.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (r, rest) = bytes
            .split_first_chunk::<32>()
            .ok_or(McmsError::InvalidSignatureBytes {
                received_length: bytes.len(),
            })?;
        let (s, tail) = rest
            .split_first_chunk::<32>()
            .ok_or(McmsError::InvalidSignatureBytes {
                received_length: bytes.len(),
            })?;
        let [v] = tail else {
            return Err(McmsError::InvalidSignatureBytes {
                received_length: bytes.len(),
            });
        };
        Ok(Self {
            r: B256::from(*r),
            s: B256::from(*s),
            v: *v,
        })
    }

    /// Concatenates the signature back into its 65-byte wire form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        let (r_part, rest) = out.split_at_mut(32);
        let (s_part, v_part) = rest.split_at_mut(32);
        r_part.copy_from_slice(self.r.as_slice());
        s_part.copy_from_slice(self.s.as_slice());
        v_part.copy_from_slice(&[self.v]);
        out
    }

    /// Returns a copy with `v` lifted into the {27, 28} range expected by
    /// the verifier contract.
    pub fn to_wire(&self) -> Self {
        let mut signature = *self;
        if signature.v < 2 {
            signature.v += 27;
        }
        signature
    }

    /// Recovers the signer address from a 32-byte digest.
    ///
    /// Legacy `v` values (anything >= 2) are reduced by 27 before recovery;
    /// signatures with an `s` scalar in the upper half of the curve order
    /// are rejected, matching the on-chain malleability check.
    pub fn recover(&self, digest: B256) -> Result<Address> {
        let v = if self.v >= 2 {
            self.v.wrapping_sub(27)
        } else {
            self.v
        };
        if v > 1 {
            return Err(McmsError::SignatureRecovery {
                reason: format!("recovery id out of range: {}", self.v),
            });
        }
        let recovery_id =
            RecoveryId::try_from(v).map_err(|e| McmsError::SignatureRecovery {
                reason: e.to_string(),
            })?;
        let signature = EcdsaSignature::from_scalars(self.r.0, self.s.0).map_err(|e| {
            McmsError::SignatureRecovery {
                reason: e.to_string(),
            }
        })?;
        if signature.normalize_s().is_some() {
            return Err(McmsError::SignatureRecovery {
                reason: "s scalar is in the upper half of the curve order".to_string(),
            });
        }
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|e| McmsError::SignatureRecovery {
                reason: e.to_string(),
            })?;
        Ok(address_of(&key))
    }
}

/// Derives the 20-byte account address of a verifying key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(encoded.as_bytes().iter().skip(1).copied().collect::<Vec<u8>>());
    Address::from_word(hash)
}
