//! # Batch Action Composer
//!
//! Appends state-mutating actions to a receipt promise. Actions of one batch
//! run in append order on the receiver, as one unit: if one fails, the rest
//! do not run and the earlier ones are undone.
//!
//! ```ignore
//! let idx = env.promise_batch_create(&"sub.dapp.test".into())?;
//! env.batch(idx)
//!     .create_account()?
//!     .transfer(Amount::ONE_TOKEN)?
//!     .add_full_access_key(&key, 0)?;
//! ```

use super::Env;
use crate::domain::value_objects::{AccountId, Amount, Gas, GasWeight, PromiseIndex, PublicKey};
use crate::errors::HostResult;
use crate::ports::outbound::HostApi;
use tracing::debug;

impl<'h, H: HostApi> Env<'h, H> {
    /// Append create-account.
    pub fn promise_batch_action_create_account(&mut self, index: PromiseIndex) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "create_account", "Batch action");
        self.host.promise_batch_action_create_account(index.as_raw())
    }

    /// Append deploy-contract.
    pub fn promise_batch_action_deploy_contract(
        &mut self,
        index: PromiseIndex,
        code: &[u8],
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "deploy_contract", code_len = code.len(), "Batch action");
        self.host
            .promise_batch_action_deploy_contract(index.as_raw(), code)
    }

    /// Append function-call.
    pub fn promise_batch_action_function_call(
        &mut self,
        index: PromiseIndex,
        method: &str,
        arguments: &[u8],
        amount: Amount,
        gas: Gas,
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "function_call", method, "Batch action");
        self.host.promise_batch_action_function_call(
            index.as_raw(),
            method,
            arguments,
            amount.as_u128(),
            gas.as_u64(),
        )
    }

    /// Append function-call with text arguments.
    pub fn promise_batch_action_function_call_text(
        &mut self,
        index: PromiseIndex,
        method: &str,
        arguments: &str,
        amount: Amount,
        gas: Gas,
    ) -> HostResult<()> {
        self.promise_batch_action_function_call(index, method, arguments.as_bytes(), amount, gas)
    }

    /// Append function-call that also receives a `weight` share of unused gas.
    pub fn promise_batch_action_function_call_weight(
        &mut self,
        index: PromiseIndex,
        method: &str,
        arguments: &[u8],
        amount: Amount,
        gas: Gas,
        weight: GasWeight,
    ) -> HostResult<()> {
        debug!(
            index = index.as_raw(),
            action = "function_call_weight",
            method,
            weight = weight.0,
            "Batch action"
        );
        self.host.promise_batch_action_function_call_weight(
            index.as_raw(),
            method,
            arguments,
            amount.as_u128(),
            gas.as_u64(),
            weight.0,
        )
    }

    /// Weighted function-call with text arguments.
    pub fn promise_batch_action_function_call_weight_text(
        &mut self,
        index: PromiseIndex,
        method: &str,
        arguments: &str,
        amount: Amount,
        gas: Gas,
        weight: GasWeight,
    ) -> HostResult<()> {
        self.promise_batch_action_function_call_weight(
            index,
            method,
            arguments.as_bytes(),
            amount,
            gas,
            weight,
        )
    }

    /// Append transfer.
    pub fn promise_batch_action_transfer(
        &mut self,
        index: PromiseIndex,
        amount: Amount,
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "transfer", %amount, "Batch action");
        self.host
            .promise_batch_action_transfer(index.as_raw(), amount.as_u128())
    }

    /// Append stake.
    pub fn promise_batch_action_stake(
        &mut self,
        index: PromiseIndex,
        amount: Amount,
        public_key: &PublicKey,
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "stake", %amount, "Batch action");
        self.host.promise_batch_action_stake(
            index.as_raw(),
            amount.as_u128(),
            &public_key.to_bytes(),
        )
    }

    /// Append add-key with full access.
    pub fn promise_batch_action_add_key_with_full_access(
        &mut self,
        index: PromiseIndex,
        public_key: &PublicKey,
        nonce: u64,
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "add_full_access_key", nonce, "Batch action");
        self.host.promise_batch_action_add_key_with_full_access(
            index.as_raw(),
            &public_key.to_bytes(),
            nonce,
        )
    }

    /// Append add-key restricted to `method_names` on `receiver_id`.
    ///
    /// `allowance` of `None` is unlimited; empty `method_names` allows any
    /// method.
    pub fn promise_batch_action_add_key_with_function_call(
        &mut self,
        index: PromiseIndex,
        public_key: &PublicKey,
        nonce: u64,
        allowance: Option<Amount>,
        receiver_id: &AccountId,
        method_names: &[&str],
    ) -> HostResult<()> {
        debug!(
            index = index.as_raw(),
            action = "add_function_call_key",
            receiver = %receiver_id,
            methods = method_names.len(),
            "Batch action"
        );
        self.host.promise_batch_action_add_key_with_function_call(
            index.as_raw(),
            &public_key.to_bytes(),
            nonce,
            allowance.map_or(0, |a| a.as_u128()),
            receiver_id.as_str(),
            &method_names.join(","),
        )
    }

    /// Append delete-key.
    pub fn promise_batch_action_delete_key(
        &mut self,
        index: PromiseIndex,
        public_key: &PublicKey,
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "delete_key", "Batch action");
        self.host
            .promise_batch_action_delete_key(index.as_raw(), &public_key.to_bytes())
    }

    /// Append delete-account.
    pub fn promise_batch_action_delete_account(
        &mut self,
        index: PromiseIndex,
        beneficiary_id: &AccountId,
    ) -> HostResult<()> {
        debug!(index = index.as_raw(), action = "delete_account", beneficiary = %beneficiary_id, "Batch action");
        self.host
            .promise_batch_action_delete_account(index.as_raw(), beneficiary_id.as_str())
    }

    /// Fluent composer over the batch `index`.
    pub fn batch(&mut self, index: PromiseIndex) -> BatchComposer<'_, 'h, H> {
        BatchComposer { env: self, index }
    }
}

// =============================================================================
// FLUENT COMPOSER
// =============================================================================

/// Chains actions onto one batch; every step can trap.
pub struct BatchComposer<'e, 'h, H: HostApi> {
    env: &'e mut Env<'h, H>,
    index: PromiseIndex,
}

impl<H: HostApi> BatchComposer<'_, '_, H> {
    /// The batch being composed.
    #[must_use]
    pub fn index(&self) -> PromiseIndex {
        self.index
    }

    /// Append create-account.
    pub fn create_account(self) -> HostResult<Self> {
        self.env.promise_batch_action_create_account(self.index)?;
        Ok(self)
    }

    /// Append deploy-contract.
    pub fn deploy_contract(self, code: &[u8]) -> HostResult<Self> {
        self.env.promise_batch_action_deploy_contract(self.index, code)?;
        Ok(self)
    }

    /// Append function-call.
    pub fn function_call(
        self,
        method: &str,
        arguments: &[u8],
        amount: Amount,
        gas: Gas,
    ) -> HostResult<Self> {
        self.env
            .promise_batch_action_function_call(self.index, method, arguments, amount, gas)?;
        Ok(self)
    }

    /// Append weighted function-call.
    pub fn function_call_weight(
        self,
        method: &str,
        arguments: &[u8],
        amount: Amount,
        gas: Gas,
        weight: GasWeight,
    ) -> HostResult<Self> {
        self.env.promise_batch_action_function_call_weight(
            self.index, method, arguments, amount, gas, weight,
        )?;
        Ok(self)
    }

    /// Append transfer.
    pub fn transfer(self, amount: Amount) -> HostResult<Self> {
        self.env.promise_batch_action_transfer(self.index, amount)?;
        Ok(self)
    }

    /// Append stake.
    pub fn stake(self, amount: Amount, public_key: &PublicKey) -> HostResult<Self> {
        self.env
            .promise_batch_action_stake(self.index, amount, public_key)?;
        Ok(self)
    }

    /// Append add-key with full access.
    pub fn add_full_access_key(self, public_key: &PublicKey, nonce: u64) -> HostResult<Self> {
        self.env
            .promise_batch_action_add_key_with_full_access(self.index, public_key, nonce)?;
        Ok(self)
    }

    /// Append add-key restricted to function calls.
    pub fn add_function_call_key(
        self,
        public_key: &PublicKey,
        nonce: u64,
        allowance: Option<Amount>,
        receiver_id: &AccountId,
        method_names: &[&str],
    ) -> HostResult<Self> {
        self.env.promise_batch_action_add_key_with_function_call(
            self.index,
            public_key,
            nonce,
            allowance,
            receiver_id,
            method_names,
        )?;
        Ok(self)
    }

    /// Append delete-key.
    pub fn delete_key(self, public_key: &PublicKey) -> HostResult<Self> {
        self.env.promise_batch_action_delete_key(self.index, public_key)?;
        Ok(self)
    }

    /// Append delete-account.
    pub fn delete_account(self, beneficiary_id: &AccountId) -> HostResult<Self> {
        self.env
            .promise_batch_action_delete_account(self.index, beneficiary_id)?;
        Ok(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
