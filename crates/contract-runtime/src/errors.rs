//! # Error Types
//!
//! All fatal conditions of a single invocation.
//!
//! A [`Trap`] aborts the invocation: every storage write and every promise
//! scheduled so far is discarded. Expected absence (missing key, failed
//! signature recovery, failed pairing check) is never a trap; it is a typed
//! `None`/`false` returned by the binding layer.

use crate::domain::value_objects::{PromiseResult, RegisterId};
use shared_crypto::CryptoError;
use thiserror::Error;

/// Result of every host call and binding-layer operation.
pub type HostResult<T> = Result<T, Trap>;

// =============================================================================
// TRAPS
// =============================================================================

/// Fatal invocation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Trap {
    /// A register was read without a preceding call that populated it.
    #[error("register {0} was read before being populated")]
    RegisterNotPopulated(RegisterId),

    /// Register content had the wrong width for a fixed-size result.
    #[error("register {register_id} holds {actual} bytes, expected {expected}")]
    UnexpectedRegisterLength {
        register_id: RegisterId,
        expected: usize,
        actual: usize,
    },

    /// Host returned a status code outside the documented set.
    #[error("host call {call} returned unexpected status {status}")]
    UnexpectedReturnCode { call: &'static str, status: u64 },

    /// Bytes expected to be UTF-8 text were not.
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// Log message was not valid little-endian UTF-16.
    #[error("invalid UTF-16 in log message")]
    InvalidUtf16,

    /// Packed curve input length is not a multiple of the item size.
    #[error("malformed {op} input: length {len} is not a multiple of {item_size}")]
    MalformedCurveInput {
        op: &'static str,
        len: usize,
        item_size: usize,
    },

    /// Curve input is well-sized but not decodable.
    #[error("invalid curve input: {0}")]
    InvalidCurveInput(String),

    /// `ecrecover` arguments violate the fixed input layout.
    #[error("malformed ecrecover input: {0}")]
    MalformedSignatureInput(String),

    /// The invocation exhausted its prepaid gas.
    #[error("gas exceeded: used {used}, prepaid {prepaid}")]
    GasExceeded { used: u64, prepaid: u64 },

    /// An accessor or mutation was used outside the context that defines it.
    #[error("{call} is not allowed in a view invocation")]
    ProhibitedInView { call: &'static str },

    /// A promise index that the host never issued.
    #[error("promise index {0} does not exist")]
    InvalidPromiseIndex(u64),

    /// Batch actions can only target receipt promises.
    #[error("cannot append actions to joint promise {0}")]
    CannotAppendActionToJointPromise(u64),

    /// Only receipts can stand for an invocation's return value.
    #[error("cannot return joint promise {0}")]
    CannotReturnJointPromise(u64),

    /// `promise_and` was called with no promises.
    #[error("cannot join an empty set of promises")]
    EmptyPromiseJoin,

    /// Promise result index beyond `promise_results_count`.
    #[error("promise result {index} out of bounds ({count} results)")]
    PromiseResultOutOfBounds { index: u64, count: u64 },

    /// Promise result status code outside {0, 1, 2}.
    #[error("unknown promise result status {0}")]
    UnknownPromiseStatus(u64),

    /// Bytes of a non-successful promise result were demanded.
    #[error("promise result is {0:?}, not Successful")]
    PromiseNotSuccessful(PromiseResult),

    /// Storage key longer than the host limit.
    #[error("storage key length {length} exceeds limit {limit}")]
    KeyLengthExceeded { length: u64, limit: u64 },

    /// Storage value longer than the host limit.
    #[error("storage value length {length} exceeds limit {limit}")]
    ValueLengthExceeded { length: u64, limit: u64 },

    /// Log message longer than the host limit.
    #[error("log length {length} exceeds limit {limit}")]
    LogLengthExceeded { length: u64, limit: u64 },

    /// Too many log entries in one invocation.
    #[error("number of logs exceeds limit {limit}")]
    NumberOfLogsExceeded { limit: u64 },

    /// Arithmetic on amounts would overflow 128 bits.
    #[error("amount overflow")]
    AmountOverflow,

    /// Deposits attached to promises exceed the account balance.
    #[error("balance exceeded: needed {needed}, available {available}")]
    BalanceExceeded { needed: u128, available: u128 },

    /// A host argument failed validation (e.g. a malformed public key).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The target account exposes no such method.
    #[error("method {method} not found on {account_id}")]
    MethodNotFound { account_id: String, method: String },

    /// The contract aborted itself with a message.
    #[error("smart contract panicked: {0}")]
    Panic(String),
}

impl Trap {
    /// Returns true if the contract raised this trap itself.
    #[must_use]
    pub fn is_contract_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }

    /// Map a host-side crypto failure for the named call.
    #[must_use]
    pub fn from_crypto(call: &'static str, err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidSequenceLength { len, item_size, .. } => {
                Self::MalformedCurveInput {
                    op: call,
                    len,
                    item_size,
                }
            }
            CryptoError::InvalidInputLength { .. }
            | CryptoError::InvalidRecoveryId(_)
            | CryptoError::InvalidMalleabilityFlag(_) => {
                Self::MalformedSignatureInput(err.to_string())
            }
            CryptoError::InvalidFieldElement
            | CryptoError::PointNotOnCurve
            | CryptoError::InvalidSignByte(_) => Self::InvalidCurveInput(format!("{call}: {err}")),
        }
    }
}

// =============================================================================
// VALUE ERRORS
// =============================================================================

/// Recoverable errors when constructing value objects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Decimal string is not a number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Value does not fit in 128 bits.
    #[error("amount exceeds u128::MAX")]
    AmountOverflow,

    /// Unknown public key curve prefix.
    #[error("unknown curve type {0}")]
    UnknownCurve(u8),

    /// Public key payload has the wrong length for its curve.
    #[error("invalid public key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Empty public key bytes.
    #[error("empty public key")]
    EmptyKey,
}

impl From<ValueError> for Trap {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::AmountOverflow => Trap::AmountOverflow,
            other => Trap::InvalidValue(other.to_string()),
        }
    }
}

// =============================================================================
// ACTION ERRORS
// =============================================================================

/// Why a scheduled receipt resolved as failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// `CreateAccount` on an existing account.
    #[error("account {0} already exists")]
    AccountAlreadyExists(String),

    /// Action on an account that does not exist.
    #[error("account {0} does not exist")]
    AccountDoesNotExist(String),

    /// Stake exceeds the account's total balance.
    #[error("insufficient balance to stake {stake}: total {total}")]
    InsufficientBalanceForStake { stake: u128, total: u128 },

    /// `Add*Key` with a key that is already present.
    #[error("access key already exists")]
    AccessKeyAlreadyExists,

    /// `DeleteKey` with an unknown key.
    #[error("access key not found")]
    AccessKeyNotFound,

    /// No contract module is deployed on the receiver.
    #[error("no contract deployed on {0}")]
    NoContractCode(String),

    /// The called method trapped.
    #[error("function call failed: {0}")]
    FunctionCallFailed(Trap),

    /// Amount arithmetic overflowed while applying the action.
    #[error("balance overflow")]
    BalanceOverflow,

    /// A predecessor failed and the policy skips dependent callbacks.
    #[error("skipped: a predecessor failed")]
    PredecessorFailed,

    /// Promise-returning calls nested deeper than the host allows.
    #[error("promise chain depth limit {0} exceeded")]
    DepthExceeded(u32),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trap_display() {
        let err = Trap::GasExceeded {
            used: 11,
            prepaid: 10,
        };
        assert_eq!(err.to_string(), "gas exceeded: used 11, prepaid 10");

        let err = Trap::RegisterNotPopulated(0);
        assert_eq!(err.to_string(), "register 0 was read before being populated");
    }

    #[test]
    fn test_contract_panic_classification() {
        assert!(Trap::Panic("boom".to_string()).is_contract_panic());
        assert!(!Trap::InvalidUtf16.is_contract_panic());
    }

    #[test]
    fn test_crypto_error_mapping() {
        let trap = Trap::from_crypto(
            "alt_bn128_g1_sum",
            CryptoError::InvalidSequenceLength {
                op: "alt_bn128_g1_sum",
                len: 64,
                item_size: 65,
            },
        );
        assert!(matches!(
            trap,
            Trap::MalformedCurveInput {
                len: 64,
                item_size: 65,
                ..
            }
        ));

        let trap = Trap::from_crypto("ecrecover", CryptoError::InvalidRecoveryId(9));
        assert!(matches!(trap, Trap::MalformedSignatureInput(_)));

        let trap = Trap::from_crypto("alt_bn128_g1_sum", CryptoError::PointNotOnCurve);
        assert!(matches!(trap, Trap::InvalidCurveInput(_)));
    }

    #[test]
    fn test_value_error_conversion() {
        let trap: Trap = ValueError::AmountOverflow.into();
        assert_eq!(trap, Trap::AmountOverflow);

        let trap: Trap = ValueError::UnknownCurve(7).into();
        assert_eq!(trap, Trap::InvalidValue("unknown curve type 7".to_string()));
    }
}
