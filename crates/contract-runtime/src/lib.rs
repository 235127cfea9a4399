//! # Contract Runtime - Guest-Side Binding Layer
//!
//! Typed access from contract logic to the fixed host call table of a
//! sandboxed VM.
//!
//! ## Purpose
//!
//! Contract code never sees host memory. Variable-length results come back
//! through numbered registers, scalars come back directly, and everything a
//! contract wants to happen outside its own invocation is described as a
//! promise graph that the host executes after the invocation commits.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A register is read only after a status that vouches for it | `channel.rs` - `fetch()` |
//! | Promise edges point only to earlier indices | `domain/promise_graph.rs` - `PromiseGraph::create_receipt()` |
//! | Actions are appended to receipts only | `domain/promise_graph.rs` - `PromiseGraph::append_action()` |
//! | Gas used never exceeds prepaid gas | `domain/gas.rs` - `GasMeter::charge()` |
//! | A trap leaves no storage write and no promise behind | `service.rs` - `InvocationRunner::invoke()` |
//! | A receipt's actions apply all or nothing | `adapters/scheduler.rs` - `PromiseScheduler` |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Value channel | `channel.rs` | Register status decoding and deferred fetch |
//! | Storage engine | `env/storage.rs` | Key-value access with eviction reporting |
//! | Context accessors | `env/context.rs` | Identities, block data, balances, gas |
//! | Cryptography | `env/crypto.rs` | Hashes, ecrecover, alt_bn128 |
//! | Promise graph builder | `env/promise.rs` | create / then / and / results / return |
//! | Batch composer | `env/batch.rs` | Action lists on receipts |
//! | Host port | `ports/outbound.rs` | The call table as a trait |
//! | In-memory host | `adapters/in_memory_host.rs` | Local execution and tests |
//! | Scheduler | `adapters/scheduler.rs` | Runs committed promise graphs |
//!
//! ## Usage Example
//!
//! ```ignore
//! use contract_runtime::prelude::*;
//!
//! let mut host = InMemoryHost::new();
//! let mut runner = InvocationRunner::new();
//! let outcome = runner.invoke(
//!     &mut host,
//!     InvocationContext::new("counter.test", "alice.test"),
//!     "increment",
//!     |env| {
//!         let count: u64 = env.storage_read("count")?.and_then(|v| v.parse().ok()).unwrap_or(0);
//!         env.storage_write("count", &(count + 1).to_string())?;
//!         env.log_str("incremented")
//!     },
//! );
//! assert!(outcome.is_committed());
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod channel;
pub mod config;
pub mod domain;
pub mod env;
pub mod errors;
pub mod ports;
pub mod service;
pub mod telemetry;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        AbortedInvocation, InvocationContext, InvocationEffects, PromiseAction, PromiseKind,
        PromiseOutcome, ReturnData, ScheduledPromise,
    };
    pub use crate::domain::promise_graph::PromiseGraph;

    // Value objects
    pub use crate::domain::value_objects::{
        AccountId, Amount, CurveType, Gas, GasWeight, PromiseIndex, PromiseResult, PublicKey,
        RegisterId, ATOMIC_OP_REGISTER, EVICTED_REGISTER,
    };

    // Gas
    pub use crate::domain::gas::{GasMeter, GasSchedule};

    // Binding layer
    pub use crate::channel::RegisterOutcome;
    pub use crate::env::{BatchComposer, Env, STORAGE_BYTE_COST};

    // Ports
    pub use crate::ports::inbound::ContractModule;
    pub use crate::ports::outbound::{HostApi, HostLifecycle};

    // Errors
    pub use crate::errors::{ActionError, HostResult, Trap, ValueError};

    // Configuration
    pub use crate::config::{ChainFailurePolicy, HostLimits, RuntimeConfig};
    pub use crate::telemetry::{init_tracing, TelemetryConfig};

    // Adapters
    pub use crate::adapters::{
        CallReport, ContractRegistry, InMemoryHost, MethodTable, PromiseScheduler,
        ReceiptExecution, WorldState,
    };

    // Service
    pub use crate::service::{InvocationOutcome, InvocationRunner, RuntimeStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = RuntimeConfig::default();
        assert_eq!(EVICTED_REGISTER, u64::MAX - 1);
        assert_eq!(AccountId::from("a.test").as_str(), "a.test");
    }
}
