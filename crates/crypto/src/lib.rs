//! # MCMS Crypto Crate Lints
//!
//! This crate enforces a strict set of lints to ensure panic-free,
//! well-documented code. Panics are disallowed in non-test code to promote
//! robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # MCMS Cryptography
//!
//! Canonical ABI encoding, keccak helpers, and the 65-byte `(r, s, v)`
//! signature primitive. Everything here is deterministic: the encoded bytes
//! must match the on-chain verifier bit for bit.

pub mod abi;
pub mod hash;
pub mod signature;

pub use hash::to_eth_signed_message_hash;
pub use signature::Signature;
