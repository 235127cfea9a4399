//! # Hash Functions
//!
//! One-shot digests backing the `sha256`, `keccak256`, `keccak512` and
//! `ripemd160` host calls.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::{Keccak256, Keccak512};

/// SHA-256 digest (32 bytes).
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Keccak-256 digest (32 bytes, original Keccak padding).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-512 digest (64 bytes).
pub fn keccak512(data: &[u8]) -> [u8; 64] {
    let digest = Keccak512::digest(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&digest);
    output
}

/// RIPEMD-160 digest (20 bytes).
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}
