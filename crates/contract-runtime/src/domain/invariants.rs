//! # Domain Invariants
//!
//! Properties that must hold for every committed invocation.
//!
//! - Promise graph edges only point backwards (acyclic forest)
//! - Joins only reference receipts; actions only live on receipts
//! - A returned promise exists in the graph
//! - Gas used never exceeds prepaid gas

use crate::domain::entities::{InvocationEffects, PromiseKind, ReturnData};
use crate::domain::promise_graph::PromiseGraph;
use crate::domain::value_objects::{Gas, PromiseIndex};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Every dependency and constituent refers to an earlier receipt.
#[must_use]
pub fn check_acyclic_invariant(graph: &PromiseGraph) -> bool {
    graph.iter().all(|node| {
        let refs: &[PromiseIndex] = match &node.kind {
            PromiseKind::Receipt { depends_on, .. } => depends_on,
            PromiseKind::Joint { constituents } => constituents,
        };
        refs.iter().all(|dep| {
            dep < &node.index && graph.get(*dep).is_ok_and(|target| target.is_receipt())
        })
    })
}

/// The returned promise, if any, is part of the graph.
#[must_use]
pub fn check_return_invariant(effects: &InvocationEffects) -> bool {
    match effects.return_data {
        ReturnData::Promise(index) => {
            effects.promises.returned() == Some(index) && effects.promises.get(index).is_ok()
        }
        _ => effects.promises.returned().is_none(),
    }
}

/// Gas accounting stays within the budget.
#[must_use]
pub fn check_gas_invariant(gas_used: Gas, prepaid: Gas) -> bool {
    gas_used <= prepaid
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(effects: &InvocationEffects, prepaid: Gas) -> bool {
    check_acyclic_invariant(&effects.promises)
        && check_return_invariant(effects)
        && check_gas_invariant(effects.gas_used, prepaid)
}

// =============================================================================
// TESTS
// =============================================================================
