//! # Invocation Runner
//!
//! Drives one invocation across a [`HostLifecycle`] host:
//!
//! 1. `begin` with the invocation context
//! 2. Run the entrypoint against a fresh [`Env`]
//! 3. `commit` on normal return, `rollback` on trap; a trap the contract
//!    swallowed still aborts at commit
//!
//! Each invocation is tagged with a v4 UUID that appears on every event
//! emitted inside its span.

use crate::domain::entities::{AbortedInvocation, InvocationContext, InvocationEffects};
use crate::domain::value_objects::Gas;
use crate::env::Env;
use crate::errors::{HostResult, Trap};
use crate::ports::inbound::ContractModule;
use crate::ports::outbound::HostLifecycle;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Counters across every invocation run by one runner.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Invocations started.
    pub invocations: u64,
    /// Invocations that committed.
    pub commits: u64,
    /// Invocations that trapped, contract panics included.
    pub traps: u64,
    /// Traps raised by the contract itself.
    pub contract_panics: u64,
    /// Gas of committed and aborted invocations.
    pub total_gas_used: u64,
    /// Promise graph nodes handed over by commits.
    pub promises_scheduled: u64,
    /// Average wall time in microseconds.
    pub avg_invocation_time_us: u64,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Correlation id of the invocation span.
    pub invocation_id: Uuid,
    /// Method that ran.
    pub method: String,
    /// Retained effects, or what survived the trap.
    pub result: Result<InvocationEffects, AbortedInvocation>,
}

impl InvocationOutcome {
    /// Returns true if the invocation committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.result.is_ok()
    }

    /// Effects of a committed invocation.
    #[must_use]
    pub fn effects(&self) -> Option<&InvocationEffects> {
        self.result.as_ref().ok()
    }

    /// Trap of an aborted invocation.
    #[must_use]
    pub fn trap(&self) -> Option<&Trap> {
        self.result.as_ref().err().map(|aborted| &aborted.trap)
    }

    /// Log lines, whether or not the invocation committed.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        match &self.result {
            Ok(effects) => &effects.logs,
            Err(aborted) => &aborted.logs,
        }
    }

    /// Gas burnt.
    #[must_use]
    pub fn gas_used(&self) -> Gas {
        match &self.result {
            Ok(effects) => effects.gas_used,
            Err(aborted) => aborted.gas_used,
        }
    }
}

/// Runs invocations and keeps statistics.
#[derive(Debug, Default)]
pub struct InvocationRunner {
    stats: RuntimeStats,
}

impl InvocationRunner {
    /// Runner with zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics so far.
    #[must_use]
    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    /// Run `entrypoint` as `method` in a fresh invocation on `host`.
    pub fn invoke<H, F>(
        &mut self,
        host: &mut H,
        context: InvocationContext,
        method: &str,
        entrypoint: F,
    ) -> InvocationOutcome
    where
        H: HostLifecycle,
        F: FnOnce(&mut Env<'_, H>) -> HostResult<()>,
    {
        self.run(Uuid::new_v4(), host, context, method, entrypoint)
    }

    /// Run `method` of `module`.
    pub fn invoke_module<H: HostLifecycle>(
        &mut self,
        host: &mut H,
        context: InvocationContext,
        method: &str,
        module: &dyn ContractModule<H>,
    ) -> InvocationOutcome {
        self.invoke(host, context, method, |env| module.invoke_method(method, env))
    }

    #[instrument(
        name = "invocation",
        skip(self, invocation_id, host, context, entrypoint),
        fields(
            invocation_id = %invocation_id,
            account = %context.current_account_id,
            view = context.is_view
        )
    )]
    fn run<H, F>(
        &mut self,
        invocation_id: Uuid,
        host: &mut H,
        context: InvocationContext,
        method: &str,
        entrypoint: F,
    ) -> InvocationOutcome
    where
        H: HostLifecycle,
        F: FnOnce(&mut Env<'_, H>) -> HostResult<()>,
    {
        let start = Instant::now();
        host.begin(context);
        let returned = entrypoint(&mut Env::new(host));

        let result = match returned {
            Ok(()) => host.commit(),
            Err(trap) => Err(host.rollback(trap)),
        };
        match &result {
            Ok(effects) => info!(
                gas_used = effects.gas_used.as_u64(),
                promises = effects.promises.len(),
                logs = effects.logs.len(),
                "Invocation committed"
            ),
            Err(aborted) => warn!(
                trap = %aborted.trap,
                gas_used = aborted.gas_used.as_u64(),
                "Invocation trapped"
            ),
        }

        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.record(&result, elapsed_us);

        InvocationOutcome {
            invocation_id,
            method: method.to_string(),
            result,
        }
    }

    fn record(&mut self, result: &Result<InvocationEffects, AbortedInvocation>, elapsed_us: u64) {
        let stats = &mut self.stats;
        stats.invocations += 1;
        match result {
            Ok(effects) => {
                stats.commits += 1;
                stats.total_gas_used += effects.gas_used.as_u64();
                stats.promises_scheduled += effects.promises.len() as u64;
            }
            Err(aborted) => {
                stats.traps += 1;
                if aborted.trap.is_contract_panic() {
                    stats.contract_panics += 1;
                }
                stats.total_gas_used += aborted.gas_used.as_u64();
            }
        }
        let total = stats.invocations;
        stats.avg_invocation_time_us =
            (stats.avg_invocation_time_us * (total - 1) + elapsed_us) / total;
    }
}

// =============================================================================
// TESTS
// =============================================================================
