//! # Gas Accounting
//!
//! Cost schedule for host calls and the per-invocation meter.
//!
//! Exhausting prepaid gas is a trap like any other: the invocation is aborted
//! and nothing it did is retained.

use crate::domain::value_objects::Gas;
use crate::errors::{HostResult, Trap};
use serde::{Deserialize, Serialize};

// =============================================================================
// GAS SCHEDULE
// =============================================================================

/// Cost of every metered host operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSchedule {
    /// Charged on every host call.
    pub base: u64,
    /// Per byte copied out of a register.
    pub read_register_byte: u64,
    /// Per byte copied into a register.
    pub write_register_byte: u64,
    /// Storage read, fixed part.
    pub storage_read_base: u64,
    /// Storage read, per key byte.
    pub storage_read_key_byte: u64,
    /// Storage read, per value byte.
    pub storage_read_value_byte: u64,
    /// Storage write, fixed part.
    pub storage_write_base: u64,
    /// Storage write, per key byte.
    pub storage_write_key_byte: u64,
    /// Storage write, per value byte.
    pub storage_write_value_byte: u64,
    /// Storage remove, fixed part.
    pub storage_remove_base: u64,
    /// Storage has-key, fixed part.
    pub storage_has_key_base: u64,
    /// Log, fixed part.
    pub log_base: u64,
    /// Log, per byte.
    pub log_byte: u64,
    /// Hash functions, fixed part.
    pub hash_base: u64,
    /// Hash functions, per input byte.
    pub hash_byte: u64,
    /// Public key recovery.
    pub ecrecover_base: u64,
    /// Curve operations, fixed part.
    pub alt_bn128_base: u64,
    /// Curve operations, per packed item.
    pub alt_bn128_item: u64,
    /// Creating a receipt or join.
    pub promise_base: u64,
    /// Appending an action.
    pub action_base: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            base: 264_768_111,
            read_register_byte: 98_562,
            write_register_byte: 3_801_564,
            storage_read_base: 56_356_845_750,
            storage_read_key_byte: 30_952_533,
            storage_read_value_byte: 5_611_005,
            storage_write_base: 64_196_736_000,
            storage_write_key_byte: 70_482_867,
            storage_write_value_byte: 31_018_539,
            storage_remove_base: 53_473_030_500,
            storage_has_key_base: 54_039_896_625,
            log_base: 3_543_313_050,
            log_byte: 13_198_791,
            hash_base: 4_540_970_250,
            hash_byte: 24_117_351,
            ecrecover_base: 278_821_988_457,
            alt_bn128_base: 713_000_000,
            alt_bn128_item: 1_000_000_000,
            promise_base: 1_500_000_000,
            action_base: 1_000_000_000,
        }
    }
}

impl GasSchedule {
    /// Schedule that charges nothing.
    #[must_use]
    pub fn free() -> Self {
        Self {
            base: 0,
            read_register_byte: 0,
            write_register_byte: 0,
            storage_read_base: 0,
            storage_read_key_byte: 0,
            storage_read_value_byte: 0,
            storage_write_base: 0,
            storage_write_key_byte: 0,
            storage_write_value_byte: 0,
            storage_remove_base: 0,
            storage_has_key_base: 0,
            log_base: 0,
            log_byte: 0,
            hash_base: 0,
            hash_byte: 0,
            ecrecover_base: 0,
            alt_bn128_base: 0,
            alt_bn128_item: 0,
            promise_base: 0,
            action_base: 0,
        }
    }
}

/// `base + per_byte * len`, saturating.
#[must_use]
pub fn linear_cost(base: u64, per_byte: u64, len: usize) -> u64 {
    base.saturating_add(per_byte.saturating_mul(len as u64))
}

// =============================================================================
// GAS METER
// =============================================================================

/// Gas consumed by one invocation against its prepaid budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    prepaid: u64,
    used: u64,
}

impl GasMeter {
    /// Creates a meter with the given budget.
    #[must_use]
    pub const fn new(prepaid: Gas) -> Self {
        Self {
            prepaid: prepaid.as_u64(),
            used: 0,
        }
    }

    /// Prepaid budget.
    #[must_use]
    pub const fn prepaid(&self) -> Gas {
        Gas::new(self.prepaid)
    }

    /// Gas used so far.
    #[must_use]
    pub const fn used(&self) -> Gas {
        Gas::new(self.used)
    }

    /// Gas left.
    #[must_use]
    pub const fn remaining(&self) -> Gas {
        Gas::new(self.prepaid.saturating_sub(self.used))
    }

    /// Consume `amount`. On exhaustion the meter is pinned at the budget.
    pub fn charge(&mut self, amount: u64) -> HostResult<()> {
        let next = self.used.saturating_add(amount);
        if next > self.prepaid {
            self.used = self.prepaid;
            return Err(Trap::GasExceeded {
                used: next,
                prepaid: self.prepaid,
            });
        }
        self.used = next;
        Ok(())
    }

    /// Consume `base + per_byte * len`.
    pub fn charge_bytes(&mut self, base: u64, per_byte: u64, len: usize) -> HostResult<()> {
        self.charge(linear_cost(base, per_byte, len))
    }
}

// =============================================================================
// TESTS
// =============================================================================
