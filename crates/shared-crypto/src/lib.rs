//! # Shared Crypto - Host Cryptographic Primitives
//!
//! **Status:** Phase 1 Implementation
//!
//! Deterministic, stateless functions that a contract host evaluates on behalf
//! of the guest. Every function is a pure function of its input bytes.
//!
//! ## Components
//!
//! | Module | Algorithm | Host call |
//! |--------|-----------|-----------|
//! | `hashing` | SHA-256, Keccak-256, Keccak-512, RIPEMD-160 | `sha256`, `keccak256`, `keccak512`, `ripemd160` |
//! | `ecdsa` | secp256k1 public key recovery | `ecrecover` |
//! | `alt_bn128` | BN254 multiexp, signed sum, pairing check | `alt_bn128_*` |
//!
//! ## Error Semantics
//!
//! - **Malformed input** (wrong lengths, out-of-range field elements, points
//!   off the curve) is reported as [`CryptoError`]; hosts treat it as a trap.
//! - **Unrecoverable signatures** are `Ok(None)`, never an error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alt_bn128;
pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use alt_bn128::{g1_multiexp, g1_sum, pairing_check};
pub use ecdsa::ecrecover;
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak512, ripemd160, sha256};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
