//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
///
/// Every variant describes input the host refuses to parse. None of them
/// represents an invalid-but-well-formed signature.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Fixed-size input has the wrong length
    #[error("Invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Packed sequence length is not a multiple of its item size
    #[error("Invalid {op} input: length {len} is not a multiple of {item_size}")]
    InvalidSequenceLength {
        /// Operation name
        op: &'static str,
        /// Actual length in bytes
        len: usize,
        /// Size of one packed item in bytes
        item_size: usize,
    },

    /// Recovery id outside 0..=3
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u64),

    /// Malleability flag other than 0 or 1
    #[error("Invalid malleability flag: {0}")]
    InvalidMalleabilityFlag(u64),

    /// Field element is not below the field modulus
    #[error("Invalid field element")]
    InvalidFieldElement,

    /// Coordinates do not describe a point on the curve
    #[error("Point is not on the curve")]
    PointNotOnCurve,

    /// Sign byte of a signed point is neither 0 nor 1
    #[error("Invalid sign byte: {0}")]
    InvalidSignByte(u8),
}
