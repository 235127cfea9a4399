//! # Promise Graph
//!
//! Arena of scheduled promises for one invocation.
//!
//! Nodes are addressed by the index the host handed out when they were
//! created, and every edge points from a later node to an earlier one, so the
//! graph is acyclic by construction. Joins are flattened: a joint node only
//! lists receipts, and a receipt chained on a join depends on every receipt
//! of that join.
//!
//! Nothing here executes. The graph is what the host commits when the
//! invocation returns normally.

use crate::domain::entities::{PromiseAction, PromiseKind, ScheduledPromise};
use crate::domain::value_objects::{AccountId, Gas, PromiseIndex};
use crate::errors::{HostResult, Trap};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Promise arena.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseGraph {
    promises: Vec<ScheduledPromise>,
    returned: Option<PromiseIndex>,
}

impl PromiseGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.promises.len()
    }

    /// Returns true if nothing was scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promises.is_empty()
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledPromise> {
        self.promises.iter()
    }

    /// Look up a node.
    pub fn get(&self, index: PromiseIndex) -> HostResult<&ScheduledPromise> {
        usize::try_from(index.as_raw())
            .ok()
            .and_then(|i| self.promises.get(i))
            .ok_or(Trap::InvalidPromiseIndex(index.as_raw()))
    }

    fn next_index(&self) -> PromiseIndex {
        PromiseIndex::from_raw(self.promises.len() as u64)
    }

    /// Receipt indices a node stands for: itself for a receipt, its
    /// constituents for a join.
    pub fn receipt_dependencies(&self, index: PromiseIndex) -> HostResult<Vec<PromiseIndex>> {
        match &self.get(index)?.kind {
            PromiseKind::Receipt { .. } => Ok(vec![index]),
            PromiseKind::Joint { constituents } => Ok(constituents.clone()),
        }
    }

    /// Add an empty receipt for `receiver_id`, optionally chained after
    /// `after`.
    pub fn create_receipt(
        &mut self,
        receiver_id: AccountId,
        after: Option<PromiseIndex>,
    ) -> HostResult<PromiseIndex> {
        let depends_on = match after {
            Some(parent) => self.receipt_dependencies(parent)?,
            None => Vec::new(),
        };
        let index = self.next_index();
        trace!(
            index = index.as_raw(),
            receiver = %receiver_id,
            dependencies = depends_on.len(),
            "Receipt scheduled"
        );
        self.promises.push(ScheduledPromise {
            index,
            kind: PromiseKind::Receipt {
                receiver_id,
                depends_on,
                actions: Vec::new(),
            },
        });
        Ok(index)
    }

    /// Add a join over `indices`.
    pub fn join(&mut self, indices: &[PromiseIndex]) -> HostResult<PromiseIndex> {
        if indices.is_empty() {
            return Err(Trap::EmptyPromiseJoin);
        }
        let mut constituents = Vec::with_capacity(indices.len());
        for &index in indices {
            constituents.extend(self.receipt_dependencies(index)?);
        }
        let index = self.next_index();
        trace!(
            index = index.as_raw(),
            constituents = constituents.len(),
            "Join scheduled"
        );
        self.promises.push(ScheduledPromise {
            index,
            kind: PromiseKind::Joint { constituents },
        });
        Ok(index)
    }

    /// Trap unless `index` is a receipt that can take actions.
    pub fn check_receipt(&self, index: PromiseIndex) -> HostResult<()> {
        if self.get(index)?.is_receipt() {
            Ok(())
        } else {
            Err(Trap::CannotAppendActionToJointPromise(index.as_raw()))
        }
    }

    /// Append an action to a receipt.
    pub fn append_action(&mut self, index: PromiseIndex, action: PromiseAction) -> HostResult<()> {
        let raw = index.as_raw();
        let node = usize::try_from(raw)
            .ok()
            .and_then(|i| self.promises.get_mut(i))
            .ok_or(Trap::InvalidPromiseIndex(raw))?;
        match &mut node.kind {
            PromiseKind::Receipt { actions, .. } => {
                trace!(index = raw, action = action.kind(), "Action appended");
                actions.push(action);
                Ok(())
            }
            PromiseKind::Joint { .. } => Err(Trap::CannotAppendActionToJointPromise(raw)),
        }
    }

    /// Mark `index` as the invocation's return value.
    pub fn set_returned(&mut self, index: PromiseIndex) -> HostResult<()> {
        if !self.get(index)?.is_receipt() {
            return Err(Trap::CannotReturnJointPromise(index.as_raw()));
        }
        self.returned = Some(index);
        Ok(())
    }

    /// Forget the returned promise; the invocation returns a plain value.
    pub fn clear_returned(&mut self) {
        self.returned = None;
    }

    /// Promise whose value is the invocation's return value.
    #[must_use]
    pub fn returned(&self) -> Option<PromiseIndex> {
        self.returned
    }

    /// Total gas attached to function-call actions.
    #[must_use]
    pub fn attached_gas(&self) -> Gas {
        let total = self
            .promises
            .iter()
            .flat_map(ScheduledPromise::actions)
            .map(|action| action.attached_gas().as_u64())
            .fold(0u64, u64::saturating_add);
        Gas::new(total)
    }

    /// Split `unused` among weighted function calls in proportion to their
    /// weight. The integer remainder goes to the last weighted call.
    ///
    /// Returns the gas handed out; zero when no call carries a weight.
    pub fn distribute_unused_gas(&mut self, unused: Gas) -> Gas {
        let total_weight: u128 = self
            .promises
            .iter()
            .flat_map(ScheduledPromise::actions)
            .filter_map(|action| match action {
                PromiseAction::FunctionCallWeight { weight, .. } => Some(u128::from(weight.0)),
                _ => None,
            })
            .sum();
        if total_weight == 0 || unused == Gas::ZERO {
            return Gas::ZERO;
        }

        let unused_raw = u128::from(unused.as_u64());
        let mut distributed: u64 = 0;
        let mut last_weighted: Option<&mut Gas> = None;

        for node in &mut self.promises {
            let PromiseKind::Receipt { actions, .. } = &mut node.kind else {
                continue;
            };
            for action in actions.iter_mut() {
                let PromiseAction::FunctionCallWeight { gas, weight, .. } = action else {
                    continue;
                };
                if weight.0 == 0 {
                    continue;
                }
                // share <= unused, so it fits in u64
                let share = (unused_raw * u128::from(weight.0) / total_weight) as u64;
                *gas = Gas::new(gas.as_u64().saturating_add(share));
                distributed += share;
                last_weighted = Some(gas);
            }
        }

        if let Some(gas) = last_weighted {
            let remainder = unused.as_u64() - distributed;
            *gas = Gas::new(gas.as_u64().saturating_add(remainder));
            distributed += remainder;
        }
        Gas::new(distributed)
    }

    /// JSON snapshot for logs and assertions.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
