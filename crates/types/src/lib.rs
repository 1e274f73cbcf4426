#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # MCMS Core Types
//!
//! This crate is the foundational library for the MCMS toolkit, containing
//! the chain registry, the shared error taxonomy, and wire-format helpers.
//!
//! ## Architectural Role
//!
//! As the base crate, `mcms-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. This structure prevents
//! circular dependencies and provides a stable, canonical definition for
//! shared types like [`chain::ChainId`] and [`error::McmsError`].

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::McmsError> = std::result::Result<T, E>;

/// Chain identifiers and the selector registry.
pub mod chain;
/// The unified error taxonomy used across the toolkit.
pub mod error;
/// Serde helpers for the JSON proposal wire format.
pub mod wire;
