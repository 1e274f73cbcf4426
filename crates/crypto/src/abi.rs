//! Canonical Solidity ABI encoding.
//!
//! The on-chain verifier hashes `abi.encode(...)` frames, so every byte
//! emitted here must match that layout: 32-byte words, head/tail separation,
//! offsets for dynamic members measured from the start of the enclosing
//! frame, and right-padded `bytes` tails.

use alloy_primitives::{keccak256, Address, B256, U256};
use mcms_types::error::McmsError;
use mcms_types::Result;

/// The ABI word size.
const WORD: usize = 32;

/// A typed value in an ABI argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An unsigned integer restricted to the given bit width (8..=256).
    Uint(U256, usize),
    /// A 20-byte account address, left-padded to one word.
    Address(Address),
    /// A boolean, encoded as one word holding 0 or 1.
    Bool(bool),
    /// A fixed 32-byte value, emitted verbatim.
    FixedBytes(B256),
    /// A dynamic byte string: length word plus right-padded payload.
    Bytes(Vec<u8>),
    /// A tuple; dynamic iff any member is dynamic.
    Tuple(Vec<Token>),
    /// A dynamic array: length word plus the elements as a nested frame.
    Array(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::Array(_) => true,
            Token::Tuple(members) => members.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    /// The number of bytes this token occupies in its frame's head section.
    fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD;
        }
        match self {
            Token::Tuple(members) => members.iter().map(Token::head_size).sum(),
            _ => WORD,
        }
    }

    /// Appends this token's own frame (head plus tail for containers).
    fn encode_frame(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Token::Uint(value, bits) => {
                if *bits < 256 && *value >> *bits != U256::ZERO {
                    return Err(McmsError::AbiValue {
                        reason: format!("value {value} does not fit uint{bits}"),
                    });
                }
                out.extend_from_slice(&value.to_be_bytes::<WORD>());
            }
            Token::Address(address) => {
                out.extend_from_slice(&[0u8; 12]);
                out.extend_from_slice(address.as_slice());
            }
            Token::Bool(value) => {
                out.extend_from_slice(&U256::from(u8::from(*value)).to_be_bytes::<WORD>());
            }
            Token::FixedBytes(value) => {
                out.extend_from_slice(value.as_slice());
            }
            Token::Bytes(payload) => {
                out.extend_from_slice(&U256::from(payload.len()).to_be_bytes::<WORD>());
                out.extend_from_slice(payload);
                let pad = (WORD - payload.len() % WORD) % WORD;
                out.resize(out.len() + pad, 0);
            }
            Token::Tuple(members) => {
                encode_into(members, out)?;
            }
            Token::Array(elements) => {
                out.extend_from_slice(&U256::from(elements.len()).to_be_bytes::<WORD>());
                encode_into(elements, out)?;
            }
        }
        Ok(())
    }
}

/// Encodes an argument list exactly as Solidity `abi.encode`.
pub fn encode(tokens: &[Token]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(tokens, &mut out)?;
    Ok(out)
}

/// Encodes a function call: the first four bytes of `keccak256(signature)`
/// followed by the encoded argument list (`abi.encodeWithSignature`).
pub fn encode_call(signature: &str, tokens: &[Token]) -> Result<Vec<u8>> {
    let selector = keccak256(signature.as_bytes());
    let mut out: Vec<u8> = selector.iter().take(4).copied().collect();
    encode_into(tokens, &mut out)?;
    Ok(out)
}

/// Encodes `tokens` as one frame appended to `out`.
///
/// Offsets of dynamic members are relative to the start of this frame, which
/// is wherever `out` currently ends, so nested frames compose naturally.
fn encode_into(tokens: &[Token], out: &mut Vec<u8>) -> Result<()> {
    let head_len: usize = tokens.iter().map(Token::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            let offset = head_len + tail.len();
            head.extend_from_slice(&U256::from(offset).to_be_bytes::<WORD>());
            token.encode_frame(&mut tail)?;
        } else {
            token.encode_frame(&mut head)?;
        }
    }

    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(())
}
