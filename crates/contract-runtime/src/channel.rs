//! # Value Channel
//!
//! Two-phase transfer of variable-length data out of the host.
//!
//! A host call that produces bytes writes them into a register and answers
//! with a scalar status. The status becomes a [`RegisterOutcome`]; only a
//! `Populated` outcome may be fetched. Reading a register without a status
//! that vouches for it is a trap.

use crate::domain::value_objects::RegisterId;
use crate::errors::{HostResult, Trap};
use crate::ports::outbound::HostApi;
use tracing::trace;

/// Result descriptor of a register-producing host call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The register holds the result.
    Populated(RegisterId),
    /// There is no result; the register must not be read.
    Empty,
}

impl RegisterOutcome {
    /// Decode a `0`/`1` status returned by `call` for `register_id`.
    pub fn from_status(call: &'static str, status: u64, register_id: RegisterId) -> HostResult<Self> {
        match status {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Populated(register_id)),
            other => Err(Trap::UnexpectedReturnCode {
                call,
                status: other,
            }),
        }
    }

    /// Returns true if the register may be read.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        matches!(self, Self::Populated(_))
    }
}

// =============================================================================
// DEFERRED FETCH
// =============================================================================

/// Copy the register out if the outcome says it holds a value.
pub fn fetch<H: HostApi>(host: &mut H, outcome: RegisterOutcome) -> HostResult<Option<Vec<u8>>> {
    match outcome {
        RegisterOutcome::Populated(register_id) => fetch_required(host, register_id).map(Some),
        RegisterOutcome::Empty => Ok(None),
    }
}

/// Copy a register that the preceding call always populates.
pub fn fetch_required<H: HostApi>(host: &mut H, register_id: RegisterId) -> HostResult<Vec<u8>> {
    let bytes = host.read_register(register_id)?;
    trace!(register_id, len = bytes.len(), "Register fetched");
    Ok(bytes)
}

/// Copy a register and decode it as UTF-8.
pub fn fetch_text<H: HostApi>(
    host: &mut H,
    register_id: RegisterId,
    context: &'static str,
) -> HostResult<String> {
    decode_utf8(fetch_required(host, register_id)?, context)
}

/// Copy a register whose content has a fixed width.
pub fn fetch_array<H: HostApi, const N: usize>(
    host: &mut H,
    register_id: RegisterId,
) -> HostResult<[u8; N]> {
    let bytes = fetch_required(host, register_id)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| Trap::UnexpectedRegisterLength {
        register_id,
        expected: N,
        actual: bytes.len(),
    })
}

/// UTF-8 decoding where invalid text is fatal.
pub fn decode_utf8(bytes: Vec<u8>, context: &'static str) -> HostResult<String> {
    String::from_utf8(bytes).map_err(|_| Trap::InvalidUtf8 { context })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryHost;
    use crate::domain::entities::InvocationContext;
    use crate::domain::value_objects::ATOMIC_OP_REGISTER;
    use crate::ports::outbound::HostLifecycle;

    fn host() -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.begin(InvocationContext::new("me.test", "alice.test").with_input(b"hello".to_vec()));
        host
    }

    #[test]
    fn test_status_decoding() {
        assert_eq!(
            RegisterOutcome::from_status("storage_read", 1, 0),
            Ok(RegisterOutcome::Populated(0))
        );
        assert_eq!(
            RegisterOutcome::from_status("storage_read", 0, 0),
            Ok(RegisterOutcome::Empty)
        );
        assert_eq!(
            RegisterOutcome::from_status("storage_read", 2, 0),
            Err(Trap::UnexpectedReturnCode {
                call: "storage_read",
                status: 2
            })
        );
    }

    #[test]
    fn test_empty_outcome_never_reads() {
        let mut host = host();
        // Register 5 was never populated; an Empty outcome must not touch it
        assert_eq!(fetch(&mut host, RegisterOutcome::Empty), Ok(None));
        assert_eq!(
            fetch(&mut host, RegisterOutcome::Populated(5)),
            Err(Trap::RegisterNotPopulated(5))
        );
    }

    #[test]
    fn test_fetch_text_and_array() {
        let mut host = host();
        host.input(ATOMIC_OP_REGISTER).unwrap();
        assert_eq!(
            fetch_text(&mut host, ATOMIC_OP_REGISTER, "input").unwrap(),
            "hello"
        );
        assert_eq!(
            fetch_array::<_, 5>(&mut host, ATOMIC_OP_REGISTER).unwrap(),
            *b"hello"
        );
        assert_eq!(
            fetch_array::<_, 32>(&mut host, ATOMIC_OP_REGISTER),
            Err(Trap::UnexpectedRegisterLength {
                register_id: ATOMIC_OP_REGISTER,
                expected: 32,
                actual: 5
            })
        );
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        assert_eq!(
            decode_utf8(vec![0xff, 0xfe], "storage value"),
            Err(Trap::InvalidUtf8 {
                context: "storage value"
            })
        );
    }
}
