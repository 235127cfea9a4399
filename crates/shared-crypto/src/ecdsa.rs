//! # ECDSA Public Key Recovery (secp256k1)
//!
//! Backs the `ecrecover` host call.
//!
//! ## Input Contract
//!
//! - `hash`: exactly 32 bytes (already hashed message)
//! - `signature`: exactly 64 bytes, `r || s`, big-endian
//! - `v`: recovery id in `0..=3` (bit 0 = y parity, bit 1 = x reduced)
//! - `malleability_flag`: `0` accepts any `s`, `1` rejects `s > n/2` (EIP-2)
//!
//! Wrong lengths, a bad recovery id or a bad flag are malformed input
//! (`Err`). A well-formed signature that does not recover is `Ok(None)`.
//!
//! ## Output
//!
//! 64-byte uncompressed public key without the SEC1 `0x04` prefix.

use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order (for malleability check).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Message hash length in bytes.
pub const HASH_LEN: usize = 32;

/// Signature length in bytes (`r || s`).
pub const SIGNATURE_LEN: usize = 64;

/// Recovered public key length in bytes (`x || y`).
pub const PUBLIC_KEY_LEN: usize = 64;

/// Recover the signer's public key from a prehashed message.
pub fn ecrecover(
    hash: &[u8],
    signature: &[u8],
    v: u64,
    malleability_flag: u64,
) -> Result<Option<[u8; PUBLIC_KEY_LEN]>, CryptoError> {
    if hash.len() != HASH_LEN {
        return Err(CryptoError::InvalidInputLength {
            expected: HASH_LEN,
            actual: hash.len(),
        });
    }
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidInputLength {
            expected: SIGNATURE_LEN,
            actual: signature.len(),
        });
    }
    let recovery_byte = match u8::try_from(v) {
        Ok(byte) if byte <= 3 => byte,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };
    let check_malleability = match malleability_flag {
        0 => false,
        1 => true,
        other => return Err(CryptoError::InvalidMalleabilityFlag(other)),
    };

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    s.copy_from_slice(&signature[32..]);

    let high_s = !is_low_s(&s);
    if check_malleability && high_s {
        return Ok(None);
    }

    // k256 only verifies low-S signatures: fold (r, s) onto (r, n - s) and
    // flip the y parity so the same key is recovered.
    let recovery_byte = if high_s {
        s = invert_s(&s);
        recovery_byte ^ 1
    } else {
        recovery_byte
    };

    let Some(recovery_id) = RecoveryId::from_byte(recovery_byte) else {
        return Ok(None);
    };

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&r);
    sig_bytes[32..].copy_from_slice(&s);
    let Ok(sig) = Signature::from_slice(&sig_bytes) else {
        return Ok(None);
    };

    let Ok(recovered_key) = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id) else {
        return Ok(None);
    };

    // Uncompressed SEC1 point: 0x04 || x || y
    let encoded = recovered_key.to_encoded_point(false);
    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(&encoded.as_bytes()[1..]);
    Ok(Some(public_key))
}

/// Returns true if `s` is at most half the curve order.
fn is_low_s(s: &[u8; 32]) -> bool {
    s.as_slice() <= SECP256K1_HALF_ORDER.as_slice()
}

/// Compute `n - s`.
fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = i32::from(SECP256K1_ORDER[i]) - i32::from(s[i]) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}
