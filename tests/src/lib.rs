//! # Contract Runtime Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion groups per component
//! │   ├── storage.rs
//! │   └── promises.rs
//! │
//! └── integration/      # Multi-invocation flows on the in-memory host
//!     ├── storage_flows.rs
//!     ├── promise_flows.rs
//!     └── crypto_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p runtime-tests
//!
//! # By category
//! cargo test -p runtime-tests integration::promise_flows
//!
//! # Benchmarks
//! cargo bench -p runtime-tests
//! ```

#![allow(unused_variables)]
#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
pub mod fixtures;
