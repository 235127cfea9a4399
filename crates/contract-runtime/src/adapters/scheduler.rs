//! # Promise Scheduler
//!
//! Executes committed promise graphs on the in-memory host.
//!
//! A graph runs in dependency waves: a receipt becomes runnable once every
//! receipt it depends on has resolved, and a join resolves once all of its
//! constituents have. Within a wave receipts run in index order.
//!
//! A receipt is one atomic batch. Its actions are applied in append order;
//! the first failing action restores the world to the state before the batch
//! and refunds the attached deposits to the predecessor. Graphs produced by
//! function calls inside a batch run after the batch has been applied.
//!
//! Whether a callback runs after a failed predecessor is decided by
//! [`ChainFailurePolicy`].

use crate::adapters::contract_registry::ContractRegistry;
use crate::adapters::in_memory_host::InMemoryHost;
use crate::config::ChainFailurePolicy;
use crate::domain::entities::{
    InvocationContext, PromiseAction, PromiseKind, PromiseOutcome, ReturnData, ScheduledPromise,
};
use crate::domain::promise_graph::PromiseGraph;
use crate::domain::value_objects::{AccountId, Amount, PromiseIndex, PublicKey};
use crate::errors::{ActionError, Trap};
use crate::ports::inbound::ContractModule;
use crate::service::{InvocationOutcome, InvocationRunner, RuntimeStats};
use tracing::{debug, info, warn};

// =============================================================================
// REPORT
// =============================================================================

/// One executed (or skipped) receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptExecution {
    /// Account that scheduled the receipt.
    pub predecessor_id: AccountId,
    /// Account the receipt ran on.
    pub receiver_id: AccountId,
    /// Index in the scheduling invocation's graph.
    pub index: PromiseIndex,
    /// Nesting level: 0 for the graph of the entry call.
    pub depth: u32,
    /// Dependency wave within its graph.
    pub wave: u32,
    /// Predecessor results handed to the receipt.
    pub observed: Vec<PromiseOutcome>,
    /// How the receipt resolved.
    pub outcome: PromiseOutcome,
    /// Why it failed, if it did.
    pub failure: Option<ActionError>,
    /// Methods called by the batch, in order.
    pub methods: Vec<String>,
    /// Log lines of those calls.
    pub logs: Vec<String>,
}

/// Result of a call and everything it scheduled.
#[derive(Debug, Clone)]
pub struct CallReport {
    /// The entry invocation.
    pub entry: InvocationOutcome,
    /// Final value: the entry's return value, or the outcome of the promise
    /// it returned.
    pub outcome: PromiseOutcome,
    /// Receipts in execution order.
    pub receipts: Vec<ReceiptExecution>,
}

impl CallReport {
    /// Receipts that ran on `receiver_id`.
    pub fn receipts_for<'a>(
        &'a self,
        receiver_id: &'a AccountId,
    ) -> impl Iterator<Item = &'a ReceiptExecution> + 'a {
        self.receipts
            .iter()
            .filter(move |r| &r.receiver_id == receiver_id)
    }

    /// The receipt that called `method`, if any.
    #[must_use]
    pub fn receipt_calling(&self, method: &str) -> Option<&ReceiptExecution> {
        self.receipts
            .iter()
            .find(|r| r.methods.iter().any(|m| m == method))
    }

    /// Every log line: the entry call's first, then receipts in order.
    #[must_use]
    pub fn all_logs(&self) -> Vec<String> {
        self.entry
            .logs()
            .iter()
            .chain(self.receipts.iter().flat_map(|r| r.logs.iter()))
            .cloned()
            .collect()
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Where a graph came from.
#[derive(Debug, Clone)]
struct Origin {
    predecessor_id: AccountId,
    signer_id: AccountId,
    signer_pk: PublicKey,
    block_index: u64,
    block_timestamp: u64,
    epoch_height: u64,
}

impl Origin {
    fn from_context(context: &InvocationContext) -> Self {
        Self {
            predecessor_id: context.current_account_id.clone(),
            signer_id: context.signer_account_id.clone(),
            signer_pk: context.signer_account_pk.clone(),
            block_index: context.block_index,
            block_timestamp: context.block_timestamp,
            epoch_height: context.epoch_height,
        }
    }

    fn for_child(&self, receiver_id: &AccountId) -> Self {
        Self {
            predecessor_id: receiver_id.clone(),
            ..self.clone()
        }
    }
}

/// Value of the last action of a batch, when it is a function call.
enum LastCall {
    /// Returned bytes (or nothing).
    Ready(PromiseOutcome),
    /// Deferred to promise `index` of child graph `child`.
    Deferred { child: usize, index: PromiseIndex },
}

/// What an applied batch leaves behind.
struct AppliedBatch {
    children: Vec<PromiseGraph>,
    last: Option<LastCall>,
}

/// Runs contracts and the promise graphs they commit.
pub struct PromiseScheduler {
    contracts: ContractRegistry,
    runner: InvocationRunner,
    policy: ChainFailurePolicy,
    max_depth: u32,
}

impl PromiseScheduler {
    /// Scheduler with the failure policy and depth limit of `host`.
    #[must_use]
    pub fn new(host: &InMemoryHost) -> Self {
        let config = host.config();
        Self {
            contracts: ContractRegistry::new(),
            runner: InvocationRunner::new(),
            policy: config.chain_failure_policy,
            max_depth: config.limits.max_promise_depth,
        }
    }

    /// Deploy a contract module on `account_id`.
    pub fn deploy(
        &mut self,
        account_id: impl Into<AccountId>,
        module: impl ContractModule<InMemoryHost> + 'static,
    ) {
        self.contracts.deploy(account_id, module);
    }

    /// Statistics of every invocation run so far.
    #[must_use]
    pub fn stats(&self) -> &RuntimeStats {
        self.runner.stats()
    }

    /// Call `method` on `context.current_account_id`, then run everything the
    /// call scheduled.
    ///
    /// The attached deposit is credited to the receiver before the call.
    pub fn call(
        &mut self,
        host: &mut InMemoryHost,
        context: InvocationContext,
        method: &str,
    ) -> CallReport {
        let receiver_id = context.current_account_id.clone();
        let origin = Origin::from_context(&context);
        if !context.attached_deposit.is_zero() {
            host.world_mut().ensure_account(&receiver_id);
            if let Err(err) = host.world_mut().credit(&receiver_id, context.attached_deposit) {
                warn!(receiver = %receiver_id, error = %err, "Deposit not credited");
            }
        }

        let entry = self.run_method(host, context, method);
        let mut receipts = Vec::new();
        let outcome = match &entry.result {
            Ok(effects) => {
                let outcomes = self.run_graph(host, &effects.promises, &origin, 0, &mut receipts);
                resolve_return(&effects.return_data, &outcomes)
            }
            Err(_) => PromiseOutcome::Failed,
        };

        info!(
            receiver = %receiver_id,
            method,
            receipts = receipts.len(),
            success = outcome.is_successful(),
            "Call settled"
        );
        CallReport {
            entry,
            outcome,
            receipts,
        }
    }

    fn run_method(
        &mut self,
        host: &mut InMemoryHost,
        context: InvocationContext,
        method: &str,
    ) -> InvocationOutcome {
        let receiver_id = context.current_account_id.clone();
        match self.contracts.get(&receiver_id) {
            Some(module) => self.runner.invoke_module(host, context, method, module),
            None => self.runner.invoke(host, context, method, |_| {
                Err(Trap::MethodNotFound {
                    account_id: receiver_id.to_string(),
                    method: method.to_string(),
                })
            }),
        }
    }

    /// Execute `graph` and return the outcome of every node, by index.
    fn run_graph(
        &mut self,
        host: &mut InMemoryHost,
        graph: &PromiseGraph,
        origin: &Origin,
        depth: u32,
        report: &mut Vec<ReceiptExecution>,
    ) -> Vec<PromiseOutcome> {
        let nodes: Vec<&ScheduledPromise> = graph.iter().collect();
        if depth >= self.max_depth {
            warn!(depth, nodes = nodes.len(), "Promise depth limit reached");
            for node in &nodes {
                if let Some(receiver_id) = node.receiver_id() {
                    let mut execution =
                        ReceiptExecution::pending(origin, receiver_id, node.index, depth, 0);
                    execution.failure = Some(ActionError::DepthExceeded(self.max_depth));
                    report.push(execution);
                }
            }
            return vec![PromiseOutcome::Failed; nodes.len()];
        }

        let mut outcomes: Vec<Option<PromiseOutcome>> = vec![None; nodes.len()];
        let mut wave = 0u32;
        loop {
            let ready: Vec<usize> = (0..nodes.len())
                .filter(|&i| {
                    outcomes[i].is_none()
                        && dependencies(&nodes[i].kind)
                            .iter()
                            .all(|&dep| resolved(&outcomes, dep).is_some())
                })
                .collect();
            if ready.is_empty() {
                break;
            }
            debug!(depth, wave, runnable = ready.len(), "Promise wave");

            for i in ready {
                let node = nodes[i];
                let observed: Vec<PromiseOutcome> = dependencies(&node.kind)
                    .iter()
                    .filter_map(|&dep| resolved(&outcomes, dep).cloned())
                    .collect();
                let outcome = match &node.kind {
                    PromiseKind::Joint { .. } => {
                        if observed.iter().all(PromiseOutcome::is_successful) {
                            PromiseOutcome::Successful(Vec::new())
                        } else {
                            PromiseOutcome::Failed
                        }
                    }
                    PromiseKind::Receipt {
                        receiver_id,
                        actions,
                        ..
                    } => {
                        let receipt = Receipt {
                            index: node.index,
                            receiver_id,
                            actions,
                            observed,
                            depth,
                            wave,
                        };
                        self.run_receipt(host, &receipt, origin, report)
                    }
                };
                outcomes[i] = Some(outcome);
            }
            wave += 1;
        }

        // Edges only point backwards, so every node resolved
        outcomes
            .into_iter()
            .map(|o| o.unwrap_or(PromiseOutcome::NotReady))
            .collect()
    }

    fn run_receipt(
        &mut self,
        host: &mut InMemoryHost,
        receipt: &Receipt<'_>,
        origin: &Origin,
        report: &mut Vec<ReceiptExecution>,
    ) -> PromiseOutcome {
        let mut execution = ReceiptExecution::pending(
            origin,
            receipt.receiver_id,
            receipt.index,
            receipt.depth,
            receipt.wave,
        );
        execution.observed = receipt.observed.clone();
        // Keep the receipt ahead of anything it schedules
        let slot = report.len();
        report.push(execution.clone());

        let skip = self.policy == ChainFailurePolicy::Skip
            && receipt
                .observed
                .iter()
                .any(|o| matches!(o, PromiseOutcome::Failed));

        let applied = if skip {
            debug!(
                receiver = %receipt.receiver_id,
                index = receipt.index.as_raw(),
                "Skipping receipt after failed predecessor"
            );
            refund_deposits(host, receipt, origin);
            Err(ActionError::PredecessorFailed)
        } else {
            self.apply_batch(host, receipt, origin, &mut execution)
        };

        execution.outcome = match applied {
            Ok(batch) => {
                let child_origin = origin.for_child(receipt.receiver_id);
                let child_outcomes: Vec<Vec<PromiseOutcome>> = batch
                    .children
                    .iter()
                    .map(|graph| {
                        self.run_graph(host, graph, &child_origin, receipt.depth + 1, report)
                    })
                    .collect();
                match batch.last {
                    None => PromiseOutcome::Successful(Vec::new()),
                    Some(LastCall::Ready(outcome)) => outcome,
                    Some(LastCall::Deferred { child, index }) => child_outcomes
                        .get(child)
                        .map_or(PromiseOutcome::Failed, |outcomes| outcome_at(outcomes, index)),
                }
            }
            Err(err) => {
                warn!(
                    receiver = %receipt.receiver_id,
                    index = receipt.index.as_raw(),
                    error = %err,
                    "Receipt failed"
                );
                execution.failure = Some(err);
                PromiseOutcome::Failed
            }
        };

        let outcome = execution.outcome.clone();
        report[slot] = execution;
        outcome
    }

    /// Apply every action of a receipt, all or nothing.
    fn apply_batch(
        &mut self,
        host: &mut InMemoryHost,
        receipt: &Receipt<'_>,
        origin: &Origin,
        execution: &mut ReceiptExecution,
    ) -> Result<AppliedBatch, ActionError> {
        let snapshot = host.world().clone();
        let mut batch = AppliedBatch {
            children: Vec::new(),
            last: None,
        };

        for action in receipt.actions {
            batch.last = None;
            let applied = match action {
                PromiseAction::FunctionCall {
                    method_name,
                    arguments,
                    deposit,
                    gas,
                }
                | PromiseAction::FunctionCallWeight {
                    method_name,
                    arguments,
                    deposit,
                    gas,
                    ..
                } => host
                    .world_mut()
                    .apply_action(receipt.receiver_id, action)
                    .and_then(|()| {
                        let context = InvocationContext {
                            current_account_id: receipt.receiver_id.clone(),
                            signer_account_id: origin.signer_id.clone(),
                            signer_account_pk: origin.signer_pk.clone(),
                            predecessor_account_id: origin.predecessor_id.clone(),
                            input: arguments.clone(),
                            block_index: origin.block_index,
                            block_timestamp: origin.block_timestamp,
                            epoch_height: origin.epoch_height,
                            attached_deposit: *deposit,
                            prepaid_gas: *gas,
                            promise_results: receipt.observed.clone(),
                            ..InvocationContext::default()
                        };
                        self.call_in_batch(host, context, method_name, execution, &mut batch)
                    }),
                _ => host.world_mut().apply_action(receipt.receiver_id, action),
            };

            if let Err(err) = applied {
                *host.world_mut() = snapshot;
                refund_deposits(host, receipt, origin);
                return Err(err);
            }
        }
        Ok(batch)
    }

    fn call_in_batch(
        &mut self,
        host: &mut InMemoryHost,
        context: InvocationContext,
        method: &str,
        execution: &mut ReceiptExecution,
        batch: &mut AppliedBatch,
    ) -> Result<(), ActionError> {
        let receiver_id = context.current_account_id.clone();
        if !self.contracts.contains(&receiver_id) {
            return Err(ActionError::NoContractCode(receiver_id.to_string()));
        }
        execution.methods.push(method.to_string());
        let outcome = self.run_method(host, context, method);
        execution.logs.extend(outcome.logs().iter().cloned());

        let effects = outcome
            .result
            .map_err(|aborted| ActionError::FunctionCallFailed(aborted.trap))?;
        let child = if effects.promises.is_empty() {
            None
        } else {
            batch.children.push(effects.promises);
            Some(batch.children.len() - 1)
        };
        batch.last = Some(match (effects.return_data, child) {
            (ReturnData::None, _) => LastCall::Ready(PromiseOutcome::Successful(Vec::new())),
            (ReturnData::Value(bytes), _) => LastCall::Ready(PromiseOutcome::Successful(bytes)),
            (ReturnData::Promise(index), Some(child)) => LastCall::Deferred { child, index },
            // A returned promise always lives in the committed graph
            (ReturnData::Promise(_), None) => LastCall::Ready(PromiseOutcome::Failed),
        });
        Ok(())
    }
}

impl ReceiptExecution {
    fn pending(
        origin: &Origin,
        receiver_id: &AccountId,
        index: PromiseIndex,
        depth: u32,
        wave: u32,
    ) -> Self {
        Self {
            predecessor_id: origin.predecessor_id.clone(),
            receiver_id: receiver_id.clone(),
            index,
            depth,
            wave,
            observed: Vec::new(),
            outcome: PromiseOutcome::Failed,
            failure: None,
            methods: Vec::new(),
            logs: Vec::new(),
        }
    }
}

/// Return the deposits of a receipt that did not apply to its predecessor.
fn refund_deposits(host: &mut InMemoryHost, receipt: &Receipt<'_>, origin: &Origin) {
    let refund = receipt
        .actions
        .iter()
        .map(|a| a.attached_deposit().as_u128())
        .fold(0u128, u128::saturating_add);
    if refund == 0 {
        return;
    }
    if let Err(err) = host
        .world_mut()
        .credit(&origin.predecessor_id, Amount::new(refund))
    {
        warn!(account = %origin.predecessor_id, error = %err, "Refund lost");
    }
}

/// Borrowed view of one receipt node.
struct Receipt<'g> {
    index: PromiseIndex,
    receiver_id: &'g AccountId,
    actions: &'g [PromiseAction],
    observed: Vec<PromiseOutcome>,
    depth: u32,
    wave: u32,
}

fn dependencies(kind: &PromiseKind) -> &[PromiseIndex] {
    match kind {
        PromiseKind::Receipt { depends_on, .. } => depends_on.as_slice(),
        PromiseKind::Joint { constituents } => constituents.as_slice(),
    }
}

fn resolved(outcomes: &[Option<PromiseOutcome>], index: PromiseIndex) -> Option<&PromiseOutcome> {
    usize::try_from(index.as_raw())
        .ok()
        .and_then(|i| outcomes.get(i))
        .and_then(Option::as_ref)
}

fn outcome_at(outcomes: &[PromiseOutcome], index: PromiseIndex) -> PromiseOutcome {
    usize::try_from(index.as_raw())
        .ok()
        .and_then(|i| outcomes.get(i))
        .cloned()
        .unwrap_or(PromiseOutcome::Failed)
}

fn resolve_return(return_data: &ReturnData, outcomes: &[PromiseOutcome]) -> PromiseOutcome {
    match return_data {
        ReturnData::None => PromiseOutcome::Successful(Vec::new()),
        ReturnData::Value(bytes) => PromiseOutcome::Successful(bytes.clone()),
        ReturnData::Promise(index) => outcome_at(outcomes, *index),
    }
}

// =============================================================================
// TESTS
// =============================================================================
