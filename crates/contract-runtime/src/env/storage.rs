//! # Storage Engine
//!
//! Byte-string key-value storage of the current account.
//!
//! `*_raw` operations work on bytes; the unsuffixed variants are UTF-8 text
//! wrappers over them. A missing key reads as `None`, never as an empty
//! value. A write or remove that replaced a value leaves it in the evicted
//! register until the next mutation.

use super::Env;
use crate::channel::{self, decode_utf8, RegisterOutcome};
use crate::domain::value_objects::{Amount, ATOMIC_OP_REGISTER, EVICTED_REGISTER};
use crate::errors::HostResult;
use crate::ports::outbound::HostApi;
use tracing::debug;

/// Cost of storing one byte for the lifetime of the record.
pub const STORAGE_BYTE_COST: Amount = Amount::new(10_000_000_000_000_000_000);

impl<H: HostApi> Env<'_, H> {
    /// Read the value under `key`.
    pub fn storage_read_raw(&mut self, key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        let status = self.host.storage_read(key, ATOMIC_OP_REGISTER)?;
        let outcome = RegisterOutcome::from_status("storage_read", status, ATOMIC_OP_REGISTER)?;
        channel::fetch(self.host, outcome)
    }

    /// Read the text value under a text key.
    pub fn storage_read(&mut self, key: &str) -> HostResult<Option<String>> {
        self.storage_read_raw(key.as_bytes())?
            .map(|bytes| decode_utf8(bytes, "storage value"))
            .transpose()
    }

    /// Returns true if `key` holds a value.
    pub fn storage_has_key_raw(&mut self, key: &[u8]) -> HostResult<bool> {
        let status = self.host.storage_has_key(key)?;
        Ok(RegisterOutcome::from_status("storage_has_key", status, ATOMIC_OP_REGISTER)?
            .is_populated())
    }

    /// Returns true if a text key holds a value.
    pub fn storage_has_key(&mut self, key: &str) -> HostResult<bool> {
        self.storage_has_key_raw(key.as_bytes())
    }

    /// Write `value` under `key`. Returns true if a previous value was evicted.
    pub fn storage_write_raw(&mut self, key: &[u8], value: &[u8]) -> HostResult<bool> {
        let status = self.host.storage_write(key, value, EVICTED_REGISTER)?;
        self.record_mutation("storage_write", status, key.len())
    }

    /// Write a text value under a text key.
    pub fn storage_write(&mut self, key: &str, value: &str) -> HostResult<bool> {
        self.storage_write_raw(key.as_bytes(), value.as_bytes())
    }

    /// Remove `key`. Returns true if a value was evicted; false is a no-op.
    pub fn storage_remove_raw(&mut self, key: &[u8]) -> HostResult<bool> {
        let status = self.host.storage_remove(key, EVICTED_REGISTER)?;
        self.record_mutation("storage_remove", status, key.len())
    }

    /// Remove a text key.
    pub fn storage_remove(&mut self, key: &str) -> HostResult<bool> {
        self.storage_remove_raw(key.as_bytes())
    }

    /// Value evicted by the most recent write or remove.
    ///
    /// `None` when that mutation evicted nothing, even if the evicted
    /// register still holds bytes from an older mutation.
    pub fn storage_get_evicted_raw(&mut self) -> HostResult<Option<Vec<u8>>> {
        let outcome = if self.last_mutation_evicted {
            RegisterOutcome::Populated(EVICTED_REGISTER)
        } else {
            RegisterOutcome::Empty
        };
        channel::fetch(self.host, outcome)
    }

    /// Evicted value decoded as text.
    pub fn storage_get_evicted(&mut self) -> HostResult<Option<String>> {
        self.storage_get_evicted_raw()?
            .map(|bytes| decode_utf8(bytes, "evicted value"))
            .transpose()
    }

    /// Storage bytes held by the current account.
    pub fn storage_usage(&mut self) -> HostResult<u64> {
        self.host.storage_usage()
    }

    /// Cost of storing one byte.
    #[must_use]
    pub const fn storage_byte_cost() -> Amount {
        STORAGE_BYTE_COST
    }

    fn record_mutation(&mut self, call: &'static str, status: u64, key_len: usize) -> HostResult<bool> {
        let evicted = RegisterOutcome::from_status(call, status, EVICTED_REGISTER)?.is_populated();
        self.last_mutation_evicted = evicted;
        debug!(call, key_len, evicted, "Storage mutated");
        Ok(evicted)
    }
}

// =============================================================================
// TESTS
// =============================================================================
