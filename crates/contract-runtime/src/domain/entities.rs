//! # Core Domain Entities
//!
//! Invocation context, deferred actions and the observable effects of one
//! invocation.

use crate::domain::promise_graph::PromiseGraph;
use crate::domain::value_objects::{AccountId, Amount, Gas, GasWeight, PromiseIndex, PromiseResult, PublicKey};
use crate::errors::Trap;
use serde::{Deserialize, Serialize};

// =============================================================================
// INVOCATION CONTEXT
// =============================================================================

/// Everything the host knows about one invocation before it starts.
///
/// Balances and validator stakes are host state, not part of the context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Account whose code is executing.
    pub current_account_id: AccountId,
    /// Account that signed the originating transaction.
    pub signer_account_id: AccountId,
    /// Public key that signed the originating transaction.
    pub signer_account_pk: PublicKey,
    /// Immediate caller.
    pub predecessor_account_id: AccountId,
    /// Call arguments.
    pub input: Vec<u8>,
    /// Current block height.
    pub block_index: u64,
    /// Block timestamp in nanoseconds.
    pub block_timestamp: u64,
    /// Current epoch.
    pub epoch_height: u64,
    /// Value attached by the caller.
    pub attached_deposit: Amount,
    /// Gas budget of the invocation.
    pub prepaid_gas: Gas,
    /// 32-byte per-invocation random seed.
    pub random_seed: Vec<u8>,
    /// Read-only invocation: no caller identity, no mutations, no promises.
    pub is_view: bool,
    /// Results of the promises this invocation was chained on.
    pub promise_results: Vec<PromiseOutcome>,
}

impl InvocationContext {
    /// Context for a direct call from `predecessor` to `current`.
    ///
    /// The predecessor also acts as signer.
    #[must_use]
    pub fn new(current: impl Into<AccountId>, predecessor: impl Into<AccountId>) -> Self {
        let predecessor = predecessor.into();
        Self {
            current_account_id: current.into(),
            signer_account_id: predecessor.clone(),
            predecessor_account_id: predecessor,
            ..Self::default()
        }
    }

    /// Sets the call arguments.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = input.into();
        self
    }

    /// Sets the attached deposit.
    #[must_use]
    pub fn with_deposit(mut self, deposit: Amount) -> Self {
        self.attached_deposit = deposit;
        self
    }

    /// Sets the prepaid gas.
    #[must_use]
    pub fn with_prepaid_gas(mut self, gas: Gas) -> Self {
        self.prepaid_gas = gas;
        self
    }

    /// Sets the signer, independent of the predecessor.
    #[must_use]
    pub fn with_signer(mut self, signer: impl Into<AccountId>, pk: PublicKey) -> Self {
        self.signer_account_id = signer.into();
        self.signer_account_pk = pk;
        self
    }

    /// Sets the results visible to a callback.
    #[must_use]
    pub fn with_promise_results(mut self, results: Vec<PromiseOutcome>) -> Self {
        self.promise_results = results;
        self
    }

    /// Sets block metadata.
    #[must_use]
    pub fn with_block(mut self, index: u64, timestamp: u64, epoch: u64) -> Self {
        self.block_index = index;
        self.block_timestamp = timestamp;
        self.epoch_height = epoch;
        self
    }

    /// Marks the invocation as a view call.
    #[must_use]
    pub fn view(mut self) -> Self {
        self.is_view = true;
        self
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        let system = AccountId::from("system");
        Self {
            current_account_id: system.clone(),
            signer_account_id: system.clone(),
            signer_account_pk: PublicKey::ed25519_zero(),
            predecessor_account_id: system,
            input: Vec::new(),
            block_index: 1,
            block_timestamp: 0,
            epoch_height: 1,
            attached_deposit: Amount::ZERO,
            prepaid_gas: Gas::from_tgas(300),
            random_seed: vec![0u8; 32],
            is_view: false,
            promise_results: Vec::new(),
        }
    }
}

// =============================================================================
// PROMISES
// =============================================================================

/// One state-mutating action attached to a receipt promise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromiseAction {
    /// Create the receiver account.
    CreateAccount,
    /// Deploy code to the receiver.
    DeployContract {
        /// Module bytes.
        code: Vec<u8>,
    },
    /// Call a method on the receiver.
    FunctionCall {
        /// Method to invoke.
        method_name: String,
        /// Call arguments.
        arguments: Vec<u8>,
        /// Attached value.
        deposit: Amount,
        /// Attached gas.
        gas: Gas,
    },
    /// Call a method and receive a weighted share of unused gas.
    FunctionCallWeight {
        /// Method to invoke.
        method_name: String,
        /// Call arguments.
        arguments: Vec<u8>,
        /// Attached value.
        deposit: Amount,
        /// Attached gas before distribution.
        gas: Gas,
        /// Share of unused gas.
        weight: GasWeight,
    },
    /// Move value to the receiver.
    Transfer {
        /// Amount to move.
        deposit: Amount,
    },
    /// Stake from the receiver account.
    Stake {
        /// Amount to lock.
        stake: Amount,
        /// Validator key.
        public_key: PublicKey,
    },
    /// Add an unrestricted access key.
    AddFullAccessKey {
        /// Key to add.
        public_key: PublicKey,
        /// Starting nonce.
        nonce: u64,
    },
    /// Add a key restricted to calls on one receiver.
    AddFunctionCallKey {
        /// Key to add.
        public_key: PublicKey,
        /// Starting nonce.
        nonce: u64,
        /// Fee allowance; `None` is unlimited.
        allowance: Option<Amount>,
        /// Only account the key may call.
        receiver_id: AccountId,
        /// Callable methods; empty means any.
        method_names: Vec<String>,
    },
    /// Remove an access key.
    DeleteKey {
        /// Key to remove.
        public_key: PublicKey,
    },
    /// Delete the receiver and send its balance to `beneficiary_id`.
    DeleteAccount {
        /// Receives the remaining balance.
        beneficiary_id: AccountId,
    },
}

impl PromiseAction {
    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateAccount => "create_account",
            Self::DeployContract { .. } => "deploy_contract",
            Self::FunctionCall { .. } => "function_call",
            Self::FunctionCallWeight { .. } => "function_call_weight",
            Self::Transfer { .. } => "transfer",
            Self::Stake { .. } => "stake",
            Self::AddFullAccessKey { .. } => "add_full_access_key",
            Self::AddFunctionCallKey { .. } => "add_function_call_key",
            Self::DeleteKey { .. } => "delete_key",
            Self::DeleteAccount { .. } => "delete_account",
        }
    }

    /// Gas the action reserves from the creating invocation.
    #[must_use]
    pub const fn attached_gas(&self) -> Gas {
        match self {
            Self::FunctionCall { gas, .. } | Self::FunctionCallWeight { gas, .. } => *gas,
            _ => Gas::ZERO,
        }
    }

    /// Value the action moves out of the creating account.
    #[must_use]
    pub const fn attached_deposit(&self) -> Amount {
        match self {
            Self::FunctionCall { deposit, .. }
            | Self::FunctionCallWeight { deposit, .. }
            | Self::Transfer { deposit } => *deposit,
            _ => Amount::ZERO,
        }
    }
}

/// One node of the promise graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPromise {
    /// Handle issued for this node.
    pub index: PromiseIndex,
    /// Receipt or join.
    pub kind: PromiseKind,
}

/// Shape of a graph node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromiseKind {
    /// Work executed on `receiver_id` once every dependency resolved.
    Receipt {
        /// Target account.
        receiver_id: AccountId,
        /// Receipt indices that must resolve first.
        depends_on: Vec<PromiseIndex>,
        /// Actions in append order.
        actions: Vec<PromiseAction>,
    },
    /// Fan-in over receipts; carries no actions.
    Joint {
        /// Joined receipt indices.
        constituents: Vec<PromiseIndex>,
    },
}

impl ScheduledPromise {
    /// Returns true for receipt nodes.
    #[must_use]
    pub const fn is_receipt(&self) -> bool {
        matches!(self.kind, PromiseKind::Receipt { .. })
    }

    /// Target account of a receipt.
    #[must_use]
    pub fn receiver_id(&self) -> Option<&AccountId> {
        match &self.kind {
            PromiseKind::Receipt { receiver_id, .. } => Some(receiver_id),
            PromiseKind::Joint { .. } => None,
        }
    }

    /// Actions of a receipt; empty for joins.
    #[must_use]
    pub fn actions(&self) -> &[PromiseAction] {
        match &self.kind {
            PromiseKind::Receipt { actions, .. } => actions,
            PromiseKind::Joint { .. } => &[],
        }
    }
}

/// Resolved value of a promise as seen by a callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromiseOutcome {
    /// Not resolved yet.
    NotReady,
    /// Resolved with the returned bytes.
    Successful(Vec<u8>),
    /// Resolved with a failure.
    Failed,
}

impl PromiseOutcome {
    /// Status code of this outcome.
    #[must_use]
    pub const fn status(&self) -> PromiseResult {
        match self {
            Self::NotReady => PromiseResult::NotReady,
            Self::Successful(_) => PromiseResult::Successful,
            Self::Failed => PromiseResult::Failed,
        }
    }

    /// Returns true if resolved successfully.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        matches!(self, Self::Successful(_))
    }

    /// Bytes of a successful result, or the status that prevents reading them.
    pub fn success(self) -> Result<Vec<u8>, PromiseResult> {
        match self {
            Self::Successful(bytes) => Ok(bytes),
            other => Err(other.status()),
        }
    }

    /// Like [`Self::success`], but a non-successful status is fatal.
    pub fn into_bytes(self) -> Result<Vec<u8>, Trap> {
        self.success().map_err(Trap::PromiseNotSuccessful)
    }
}

// =============================================================================
// INVOCATION EFFECTS
// =============================================================================

/// Value an invocation hands back to its caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnData {
    /// Nothing returned.
    #[default]
    None,
    /// Bytes passed to `value_return`.
    Value(Vec<u8>),
    /// Result deferred to a promise of this invocation.
    Promise(PromiseIndex),
}

/// Effects retained after an invocation returned normally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEffects {
    /// Account that ran.
    pub account_id: AccountId,
    /// Return value.
    pub return_data: ReturnData,
    /// Log lines in emission order.
    pub logs: Vec<String>,
    /// Gas burnt, including gas attached to promises.
    pub gas_used: Gas,
    /// Committed promise graph.
    pub promises: PromiseGraph,
    /// Storage bytes held by the account after commit.
    pub storage_usage: u64,
}

/// What survives a trapped invocation: only the logs and the gas it burnt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbortedInvocation {
    /// Account that ran.
    pub account_id: AccountId,
    /// The fatal condition.
    pub trap: Trap,
    /// Log lines emitted before the trap.
    pub logs: Vec<String>,
    /// Gas burnt before the trap.
    pub gas_used: Gas,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = InvocationContext::new("counter.test", "alice.test")
            .with_input(b"{}".to_vec())
            .with_deposit(Amount::new(5))
            .view();
        assert_eq!(ctx.current_account_id.as_str(), "counter.test");
        assert_eq!(ctx.signer_account_id.as_str(), "alice.test");
        assert_eq!(ctx.predecessor_account_id.as_str(), "alice.test");
        assert_eq!(ctx.attached_deposit, Amount::new(5));
        assert!(ctx.is_view);
        assert_eq!(ctx.random_seed.len(), 32);
    }

    #[test]
    fn test_outcome_refuses_bytes_unless_successful() {
        assert_eq!(
            PromiseOutcome::Successful(b"ok".to_vec()).success(),
            Ok(b"ok".to_vec())
        );
        assert_eq!(PromiseOutcome::Failed.success(), Err(PromiseResult::Failed));
        assert_eq!(
            PromiseOutcome::NotReady.into_bytes(),
            Err(Trap::PromiseNotSuccessful(PromiseResult::NotReady))
        );
    }

    #[test]
    fn test_action_accounting() {
        let call = PromiseAction::FunctionCall {
            method_name: "ping".into(),
            arguments: vec![],
            deposit: Amount::new(3),
            gas: Gas::new(10),
        };
        assert_eq!(call.kind(), "function_call");
        assert_eq!(call.attached_gas(), Gas::new(10));
        assert_eq!(call.attached_deposit(), Amount::new(3));

        let transfer = PromiseAction::Transfer {
            deposit: Amount::new(9),
        };
        assert_eq!(transfer.attached_gas(), Gas::ZERO);
        assert_eq!(transfer.attached_deposit(), Amount::new(9));
    }

    #[test]
    fn test_action_json_is_tagged() {
        let json = serde_json::to_value(PromiseAction::Transfer {
            deposit: Amount::new(1),
        })
        .unwrap();
        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["deposit"], "1");
    }
}
