//! # Value Objects
//!
//! Immutable primitives crossing the host boundary.
//! These types represent concepts that are defined by their value, not identity.

use crate::errors::{Trap, ValueError};
use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// REGISTERS
// =============================================================================

/// Host-side buffer slot id.
pub type RegisterId = u64;

/// Scratch register used for every variable-length result.
pub const ATOMIC_OP_REGISTER: RegisterId = 0;

/// Register that always holds the value last evicted by a storage mutation.
pub const EVICTED_REGISTER: RegisterId = u64::MAX - 1;

// =============================================================================
// ACCOUNT ID
// =============================================================================

/// Account (module) identity.
///
/// Length and character-set rules are host-enforced and not re-validated here.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an account id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// AMOUNT (128-bit)
// =============================================================================

/// Token amount in the smallest unit.
///
/// Serialized as a decimal string so JSON never truncates it. Parsing goes
/// through `U256` and rejects anything above `u128::MAX`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(u128);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// One whole token (10^24 units).
    pub const ONE_TOKEN: Self = Self(1_000_000_000_000_000_000_000_000);

    /// Creates an amount from raw units.
    #[must_use]
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// Returns the raw units.
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Returns true if zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Self) -> Result<Self, Trap> {
        self.0.checked_add(other.0).map(Self).ok_or(Trap::AmountOverflow)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Self) -> Result<Self, Trap> {
        self.0.checked_sub(other.0).map(Self).ok_or(Trap::AmountOverflow)
    }

    /// Checked multiplication by a plain factor.
    pub fn checked_mul(self, factor: u128) -> Result<Self, Trap> {
        self.0.checked_mul(factor).map(Self).ok_or(Trap::AmountOverflow)
    }

    /// Little-endian bytes as written to linear memory.
    #[must_use]
    pub const fn to_le_bytes(&self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    /// Reads an amount from little-endian bytes.
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }
}

impl TryFrom<U256> for Amount {
    type Error = ValueError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value > U256::from(u128::MAX) {
            return Err(ValueError::AmountOverflow);
        }
        Ok(Self(value.as_u128()))
    }
}

impl From<Amount> for U256 {
    fn from(amount: Amount) -> Self {
        U256::from(amount.0)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl FromStr for Amount {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::InvalidAmount(s.to_string()));
        }
        // Anything longer than 78 digits overflows U256 itself
        if trimmed.len() > 78 {
            return Err(ValueError::AmountOverflow);
        }
        let wide = U256::from_dec_str(trimmed).map_err(|_| ValueError::AmountOverflow)?;
        Self::try_from(wide)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// GAS
// =============================================================================

/// Computational budget.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Gas(u64);

impl Gas {
    /// No gas.
    pub const ZERO: Self = Self(0);

    /// One teragas.
    pub const ONE_TERA: Self = Self(1_000_000_000_000);

    /// Creates a gas amount.
    #[must_use]
    pub const fn new(gas: u64) -> Self {
        Self(gas)
    }

    /// Creates a gas amount from teragas, saturating at `u64::MAX`.
    #[must_use]
    pub const fn from_tgas(tgas: u64) -> Self {
        Self(tgas.saturating_mul(Self::ONE_TERA.0))
    }

    /// Returns the raw gas.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} gas", self.0)
    }
}

/// Relative share of unused gas for a weighted function call.
///
/// Only meaningful relative to the other weights of the same invocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GasWeight(pub u64);

impl Default for GasWeight {
    fn default() -> Self {
        Self(1)
    }
}

// =============================================================================
// PROMISES
// =============================================================================

/// Opaque handle to deferred work, issued only by the host.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromiseIndex(u64);

impl PromiseIndex {
    /// Wraps an index returned by a host call.
    ///
    /// Only host implementations construct indices; contract code passes them
    /// back verbatim.
    #[must_use]
    pub const fn from_raw(index: u64) -> Self {
        Self(index)
    }

    /// Returns the raw index for the host call table.
    #[must_use]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromiseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status of a previously scheduled promise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PromiseResult {
    /// Not resolved yet.
    NotReady = 0,
    /// Resolved with a value.
    Successful = 1,
    /// Resolved with a failure.
    Failed = 2,
}

impl PromiseResult {
    /// Status code used by the host call table.
    #[must_use]
    pub const fn code(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for PromiseResult {
    type Error = Trap;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NotReady),
            1 => Ok(Self::Successful),
            2 => Ok(Self::Failed),
            other => Err(Trap::UnknownPromiseStatus(other)),
        }
    }
}

// =============================================================================
// PUBLIC KEYS
// =============================================================================

/// Curve of an access or staking key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CurveType {
    /// Ed25519, 32-byte keys.
    Ed25519 = 0,
    /// secp256k1, 64-byte uncompressed keys without prefix.
    Secp256k1 = 1,
}

impl CurveType {
    /// Payload length of a key on this curve.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Ed25519 => 32,
            Self::Secp256k1 => 64,
        }
    }
}

impl TryFrom<u8> for CurveType {
    type Error = ValueError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Self::Ed25519),
            1 => Ok(Self::Secp256k1),
            other => Err(ValueError::UnknownCurve(other)),
        }
    }
}

/// Public key as the host serializes it: curve byte followed by key payload.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    curve: CurveType,
    data: Vec<u8>,
}

impl PublicKey {
    /// Creates a key, checking the payload length for the curve.
    pub fn new(curve: CurveType, data: Vec<u8>) -> Result<Self, ValueError> {
        if data.len() != curve.key_len() {
            return Err(ValueError::InvalidKeyLength {
                expected: curve.key_len(),
                actual: data.len(),
            });
        }
        Ok(Self { curve, data })
    }

    /// All-zero Ed25519 key, used where a context carries no signer.
    #[must_use]
    pub fn ed25519_zero() -> Self {
        Self {
            curve: CurveType::Ed25519,
            data: vec![0u8; 32],
        }
    }

    /// Curve of this key.
    #[must_use]
    pub const fn curve(&self) -> CurveType {
        self.curve
    }

    /// Key payload without the curve byte.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Host encoding: curve byte followed by payload.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.data.len());
        bytes.push(self.curve as u8);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = ValueError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let (&curve, data) = bytes.split_first().ok_or(ValueError::EmptyKey)?;
        Self::new(CurveType::try_from(curve)?, data.to_vec())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?}, 0x", self.curve)?;
        for byte in &self.data[..self.data.len().min(4)] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...)")
    }
}

// =============================================================================
// TESTS
// =============================================================================
