//! # Runtime Configuration
//!
//! Host limits, gas schedule and scheduling policy of the in-memory host.

use crate::domain::gas::GasSchedule;
use crate::domain::value_objects::Amount;
use crate::env::STORAGE_BYTE_COST;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Size limits enforced by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLimits {
    /// Longest storage key.
    pub max_key_len: u64,
    /// Longest storage value.
    pub max_value_len: u64,
    /// Longest log line in bytes.
    pub max_log_len: u64,
    /// Most log lines per invocation.
    pub max_logs: u64,
    /// Deepest chain of promise-returning calls the scheduler follows.
    pub max_promise_depth: u32,
}

impl Default for HostLimits {
    fn default() -> Self {
        Self {
            max_key_len: 2048,
            max_value_len: 4 * 1024 * 1024,
            max_log_len: 16 * 1024,
            max_logs: 100,
            max_promise_depth: 64,
        }
    }
}

/// Whether a chained callback runs when a predecessor failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFailurePolicy {
    /// Run the callback; it observes the failed result.
    #[default]
    Run,
    /// Resolve the callback as failed without running it.
    Skip,
}

impl FromStr for ChainFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "run" => Ok(Self::Run),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown chain failure policy: {other}")),
        }
    }
}

/// Configuration of the in-memory host and scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Gas cost table.
    pub gas: GasSchedule,
    /// Size limits.
    pub limits: HostLimits,
    /// Bytes charged per stored record on top of key and value.
    pub storage_record_overhead: u64,
    /// Cost of one stored byte.
    pub storage_byte_cost: Amount,
    /// Callback behavior after a failed predecessor.
    pub chain_failure_policy: ChainFailurePolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gas: GasSchedule::default(),
            limits: HostLimits::default(),
            storage_record_overhead: 40,
            storage_byte_cost: STORAGE_BYTE_COST,
            chain_failure_policy: ChainFailurePolicy::Run,
        }
    }
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CR_STORAGE_RECORD_OVERHEAD`: Per-record overhead (default: 40)
    /// - `CR_MAX_KEY_LEN`: Storage key limit (default: 2048)
    /// - `CR_MAX_VALUE_LEN`: Storage value limit (default: 4 MiB)
    /// - `CR_MAX_LOG_LEN`: Log line limit (default: 16 KiB)
    /// - `CR_MAX_LOGS`: Log lines per invocation (default: 100)
    /// - `CR_CHAIN_FAILURE_POLICY`: `run` or `skip` (default: run)
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gas: defaults.gas,
            limits: HostLimits {
                max_key_len: parse_var("CR_MAX_KEY_LEN").unwrap_or(defaults.limits.max_key_len),
                max_value_len: parse_var("CR_MAX_VALUE_LEN")
                    .unwrap_or(defaults.limits.max_value_len),
                max_log_len: parse_var("CR_MAX_LOG_LEN").unwrap_or(defaults.limits.max_log_len),
                max_logs: parse_var("CR_MAX_LOGS").unwrap_or(defaults.limits.max_logs),
                max_promise_depth: defaults.limits.max_promise_depth,
            },
            storage_record_overhead: parse_var("CR_STORAGE_RECORD_OVERHEAD")
                .unwrap_or(defaults.storage_record_overhead),
            storage_byte_cost: defaults.storage_byte_cost,
            chain_failure_policy: parse_var("CR_CHAIN_FAILURE_POLICY")
                .unwrap_or(defaults.chain_failure_policy),
        }
    }

    /// Configuration that charges no gas, for tests that count bytes.
    #[must_use]
    pub fn without_gas_costs() -> Self {
        Self {
            gas: GasSchedule::free(),
            ..Self::default()
        }
    }

    /// Same configuration with a different failure policy.
    #[must_use]
    pub fn with_chain_failure_policy(mut self, policy: ChainFailurePolicy) -> Self {
        self.chain_failure_policy = policy;
        self
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
