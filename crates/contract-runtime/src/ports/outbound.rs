//! # Driven Ports (SPI - Outbound)
//!
//! The fixed host call table.
//!
//! [`HostApi`] mirrors the call table one method per host function, with the
//! raw scalar encodings of the boundary: registers and promise indices are
//! `u64`, amounts are `u128`, status flags are `u64`. Implementations must not
//! reinterpret the contract: variable-length results go into the named
//! register and scalars come back directly.
//!
//! Two implementations exist: the in-memory host used for tests and local
//! execution, and the `wasm32` host that performs the real boundary crossing.

use crate::domain::entities::{AbortedInvocation, InvocationContext, InvocationEffects};
use crate::errors::{HostResult, Trap};

/// The host call table.
///
/// Every call may trap. A trap is fatal for the invocation.
pub trait HostApi {
    // =========================================================================
    // REGISTERS
    // =========================================================================

    /// Copy a register's content out. Trap if it was never populated.
    fn read_register(&mut self, register_id: u64) -> HostResult<Vec<u8>>;

    /// Length of a register, `u64::MAX` if it was never populated.
    fn register_len(&mut self, register_id: u64) -> HostResult<u64>;

    // =========================================================================
    // CONTEXT
    // =========================================================================

    /// Write the current account id into a register.
    fn current_account_id(&mut self, register_id: u64) -> HostResult<()>;

    /// Write the signer account id into a register.
    fn signer_account_id(&mut self, register_id: u64) -> HostResult<()>;

    /// Write the signer public key (curve byte + key) into a register.
    fn signer_account_pk(&mut self, register_id: u64) -> HostResult<()>;

    /// Write the predecessor account id into a register.
    fn predecessor_account_id(&mut self, register_id: u64) -> HostResult<()>;

    /// Write the call arguments into a register.
    fn input(&mut self, register_id: u64) -> HostResult<()>;

    /// Current block height.
    fn block_index(&mut self) -> HostResult<u64>;

    /// Current block timestamp in nanoseconds.
    fn block_timestamp(&mut self) -> HostResult<u64>;

    /// Current epoch height.
    fn epoch_height(&mut self) -> HostResult<u64>;

    /// Storage bytes held by the current account.
    fn storage_usage(&mut self) -> HostResult<u64>;

    /// Balance of the current account.
    fn account_balance(&mut self) -> HostResult<u128>;

    /// Locked (staked) balance of the current account.
    fn account_locked_balance(&mut self) -> HostResult<u128>;

    /// Value attached to this call.
    fn attached_deposit(&mut self) -> HostResult<u128>;

    /// Gas budget of this invocation.
    fn prepaid_gas(&mut self) -> HostResult<u64>;

    /// Gas burnt so far.
    fn used_gas(&mut self) -> HostResult<u64>;

    /// Write the 32-byte random seed into a register.
    fn random_seed(&mut self, register_id: u64) -> HostResult<()>;

    /// Stake of a validator in the current epoch, zero if not a validator.
    fn validator_stake(&mut self, account_id: &str) -> HostResult<u128>;

    /// Total validator stake in the current epoch.
    fn validator_total_stake(&mut self) -> HostResult<u128>;

    // =========================================================================
    // CRYPTOGRAPHY
    // =========================================================================

    /// SHA-256 into a register.
    fn sha256(&mut self, value: &[u8], register_id: u64) -> HostResult<()>;

    /// Keccak-256 into a register.
    fn keccak256(&mut self, value: &[u8], register_id: u64) -> HostResult<()>;

    /// Keccak-512 into a register.
    fn keccak512(&mut self, value: &[u8], register_id: u64) -> HostResult<()>;

    /// RIPEMD-160 into a register.
    fn ripemd160(&mut self, value: &[u8], register_id: u64) -> HostResult<()>;

    /// Recover a secp256k1 public key. `1` and register populated on
    /// success, `0` when recovery fails.
    fn ecrecover(
        &mut self,
        hash: &[u8],
        signature: &[u8],
        v: u64,
        malleability_flag: u64,
        register_id: u64,
    ) -> HostResult<u64>;

    /// alt_bn128 multi-scalar multiplication into a register.
    fn alt_bn128_g1_multiexp(&mut self, value: &[u8], register_id: u64) -> HostResult<()>;

    /// alt_bn128 signed point sum into a register.
    fn alt_bn128_g1_sum(&mut self, value: &[u8], register_id: u64) -> HostResult<()>;

    /// alt_bn128 pairing check: `1` if the product is one, else `0`.
    fn alt_bn128_pairing_check(&mut self, value: &[u8]) -> HostResult<u64>;

    // =========================================================================
    // MISC
    // =========================================================================

    /// Set the invocation's return value.
    fn value_return(&mut self, value: &[u8]) -> HostResult<()>;

    /// Abort with a UTF-8 message. Never returns normally: the returned trap
    /// must be propagated.
    fn panic_utf8(&mut self, message: &[u8]) -> Trap;

    /// Emit a UTF-8 log line.
    fn log_utf8(&mut self, message: &[u8]) -> HostResult<()>;

    /// Emit a little-endian UTF-16 log line.
    fn log_utf16(&mut self, message: &[u8]) -> HostResult<()>;

    // =========================================================================
    // PROMISES
    // =========================================================================

    /// Schedule an independent function call.
    fn promise_create(
        &mut self,
        account_id: &str,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<u64>;

    /// Schedule a function call after `promise_index` resolves.
    fn promise_then(
        &mut self,
        promise_index: u64,
        account_id: &str,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<u64>;

    /// Join several promises.
    fn promise_and(&mut self, promise_indices: &[u64]) -> HostResult<u64>;

    /// Open an empty batch for `account_id`.
    fn promise_batch_create(&mut self, account_id: &str) -> HostResult<u64>;

    /// Open an empty batch for `account_id` after `promise_index` resolves.
    fn promise_batch_then(&mut self, promise_index: u64, account_id: &str) -> HostResult<u64>;

    /// Number of results this invocation was chained on.
    fn promise_results_count(&mut self) -> HostResult<u64>;

    /// Status of result `result_idx`; bytes go to the register when successful.
    fn promise_result(&mut self, result_idx: u64, register_id: u64) -> HostResult<u64>;

    /// Defer the invocation's return value to `promise_index`.
    fn promise_return(&mut self, promise_index: u64) -> HostResult<()>;

    // =========================================================================
    // BATCH ACTIONS
    // =========================================================================

    /// Append create-account.
    fn promise_batch_action_create_account(&mut self, promise_index: u64) -> HostResult<()>;

    /// Append deploy-contract.
    fn promise_batch_action_deploy_contract(
        &mut self,
        promise_index: u64,
        code: &[u8],
    ) -> HostResult<()>;

    /// Append function-call.
    fn promise_batch_action_function_call(
        &mut self,
        promise_index: u64,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<()>;

    /// Append function-call with a share of unused gas.
    fn promise_batch_action_function_call_weight(
        &mut self,
        promise_index: u64,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
        weight: u64,
    ) -> HostResult<()>;

    /// Append transfer.
    fn promise_batch_action_transfer(&mut self, promise_index: u64, amount: u128)
        -> HostResult<()>;

    /// Append stake.
    fn promise_batch_action_stake(
        &mut self,
        promise_index: u64,
        amount: u128,
        public_key: &[u8],
    ) -> HostResult<()>;

    /// Append add-key with full access.
    fn promise_batch_action_add_key_with_full_access(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
        nonce: u64,
    ) -> HostResult<()>;

    /// Append add-key restricted to function calls. `allowance == 0` is
    /// unlimited; `method_names` is comma-separated.
    fn promise_batch_action_add_key_with_function_call(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
        nonce: u64,
        allowance: u128,
        receiver_id: &str,
        method_names: &str,
    ) -> HostResult<()>;

    /// Append delete-key.
    fn promise_batch_action_delete_key(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
    ) -> HostResult<()>;

    /// Append delete-account.
    fn promise_batch_action_delete_account(
        &mut self,
        promise_index: u64,
        beneficiary_id: &str,
    ) -> HostResult<()>;

    // =========================================================================
    // STORAGE
    // =========================================================================

    /// Write a value. `1` and the old value in the register if one was evicted.
    fn storage_write(&mut self, key: &[u8], value: &[u8], register_id: u64) -> HostResult<u64>;

    /// Read a value. `1` and the value in the register if present.
    fn storage_read(&mut self, key: &[u8], register_id: u64) -> HostResult<u64>;

    /// Remove a value. `1` and the old value in the register if present.
    fn storage_remove(&mut self, key: &[u8], register_id: u64) -> HostResult<u64>;

    /// `1` if the key is present.
    fn storage_has_key(&mut self, key: &[u8]) -> HostResult<u64>;
}

/// Invocation boundaries on a host that can stage effects.
///
/// `begin` opens a fresh register file, gas meter and promise graph. Exactly
/// one of `commit` or `rollback` closes the invocation. A trap raised by any
/// host call aborts the invocation even when the contract ignored it, so
/// `commit` may still roll back.
pub trait HostLifecycle: HostApi {
    /// Start an invocation.
    fn begin(&mut self, context: InvocationContext);

    /// Keep storage writes and hand over the scheduled promises, unless a
    /// trap was raised, in which case everything is rolled back.
    fn commit(&mut self) -> Result<InvocationEffects, AbortedInvocation>;

    /// Discard storage writes and scheduled promises.
    fn rollback(&mut self, trap: Trap) -> AbortedInvocation;
}
