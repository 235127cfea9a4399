//! # Promise Graph Builder
//!
//! Schedules cross-account calls that run after this invocation returns.
//!
//! - `promise_create` - independent call
//! - `promise_then` - call that starts after its parent resolved, successfully or not
//! - `promise_and` - fan-in over several promises
//! - `promise_return` - defer this invocation's result to a promise
//!
//! Handles come from the host and are passed back verbatim.

use super::Env;
use crate::channel::fetch_required;
use crate::domain::entities::PromiseOutcome;
use crate::domain::value_objects::{
    AccountId, Amount, Gas, PromiseIndex, PromiseResult, ATOMIC_OP_REGISTER,
};
use crate::errors::{HostResult, Trap};
use crate::ports::outbound::HostApi;
use tracing::debug;

impl<H: HostApi> Env<'_, H> {
    /// Schedule `method` on `account_id`.
    pub fn promise_create(
        &mut self,
        account_id: &AccountId,
        method: &str,
        arguments: &[u8],
        amount: Amount,
        gas: Gas,
    ) -> HostResult<PromiseIndex> {
        let raw = self.host.promise_create(
            account_id.as_str(),
            method,
            arguments,
            amount.as_u128(),
            gas.as_u64(),
        )?;
        debug!(index = raw, receiver = %account_id, method, "Promise created");
        Ok(PromiseIndex::from_raw(raw))
    }

    /// [`Self::promise_create`] with text arguments.
    pub fn promise_create_text(
        &mut self,
        account_id: &AccountId,
        method: &str,
        arguments: &str,
        amount: Amount,
        gas: Gas,
    ) -> HostResult<PromiseIndex> {
        self.promise_create(account_id, method, arguments.as_bytes(), amount, gas)
    }

    /// Schedule `method` on `account_id` after `parent` resolves.
    pub fn promise_then(
        &mut self,
        parent: PromiseIndex,
        account_id: &AccountId,
        method: &str,
        arguments: &[u8],
        amount: Amount,
        gas: Gas,
    ) -> HostResult<PromiseIndex> {
        let raw = self.host.promise_then(
            parent.as_raw(),
            account_id.as_str(),
            method,
            arguments,
            amount.as_u128(),
            gas.as_u64(),
        )?;
        debug!(index = raw, parent = parent.as_raw(), receiver = %account_id, method, "Promise chained");
        Ok(PromiseIndex::from_raw(raw))
    }

    /// [`Self::promise_then`] with text arguments.
    pub fn promise_then_text(
        &mut self,
        parent: PromiseIndex,
        account_id: &AccountId,
        method: &str,
        arguments: &str,
        amount: Amount,
        gas: Gas,
    ) -> HostResult<PromiseIndex> {
        self.promise_then(parent, account_id, method, arguments.as_bytes(), amount, gas)
    }

    /// Promise that resolves once every promise in `indices` resolved.
    pub fn promise_and(&mut self, indices: &[PromiseIndex]) -> HostResult<PromiseIndex> {
        let raw_indices: Vec<u64> = indices.iter().map(PromiseIndex::as_raw).collect();
        let raw = self.host.promise_and(&raw_indices)?;
        debug!(index = raw, joined = indices.len(), "Promises joined");
        Ok(PromiseIndex::from_raw(raw))
    }

    /// Open an empty batch on `account_id`.
    pub fn promise_batch_create(&mut self, account_id: &AccountId) -> HostResult<PromiseIndex> {
        let raw = self.host.promise_batch_create(account_id.as_str())?;
        debug!(index = raw, receiver = %account_id, "Batch created");
        Ok(PromiseIndex::from_raw(raw))
    }

    /// Open an empty batch on `account_id` after `parent` resolves.
    pub fn promise_batch_then(
        &mut self,
        parent: PromiseIndex,
        account_id: &AccountId,
    ) -> HostResult<PromiseIndex> {
        let raw = self
            .host
            .promise_batch_then(parent.as_raw(), account_id.as_str())?;
        debug!(index = raw, parent = parent.as_raw(), receiver = %account_id, "Batch chained");
        Ok(PromiseIndex::from_raw(raw))
    }

    /// Number of results this invocation was chained on.
    pub fn promise_results_count(&mut self) -> HostResult<u64> {
        self.host.promise_results_count()
    }

    /// Result `index` of the promises this invocation was chained on.
    pub fn promise_result(&mut self, index: u64) -> HostResult<PromiseOutcome> {
        let status = self.host.promise_result(index, ATOMIC_OP_REGISTER)?;
        match PromiseResult::try_from(status)? {
            PromiseResult::Successful => {
                fetch_required(self.host, ATOMIC_OP_REGISTER).map(PromiseOutcome::Successful)
            }
            PromiseResult::Failed => Ok(PromiseOutcome::Failed),
            PromiseResult::NotReady => Ok(PromiseOutcome::NotReady),
        }
    }

    /// Successful result `index` as text. Any other status traps.
    pub fn promise_result_text(&mut self, index: u64) -> HostResult<String> {
        let bytes = self.promise_result(index)?.into_bytes()?;
        String::from_utf8(bytes).map_err(|_| Trap::InvalidUtf8 {
            context: "promise result",
        })
    }

    /// Make `index` the value of this invocation.
    pub fn promise_return(&mut self, index: PromiseIndex) -> HostResult<()> {
        debug!(index = index.as_raw(), "Promise returned");
        self.host.promise_return(index.as_raw())
    }
}

// =============================================================================
// TESTS
// =============================================================================
