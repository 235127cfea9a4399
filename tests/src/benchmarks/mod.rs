//! # Contract Runtime Benchmarks
//!
//! Criterion groups per component, wired up in `benches/runtime_benchmarks.rs`.

pub mod promises;
pub mod storage;
