//! # Integration Flows
//!
//! Contracts written as `MethodTable`s, deployed on a `PromiseScheduler`
//! and driven through whole calls: entry invocation, commit, and every
//! receipt the call scheduled.

pub mod crypto_flows;
pub mod promise_flows;
pub mod storage_flows;
