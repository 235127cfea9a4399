//! # Adapters Layer (Outer Hexagon)
//!
//! Implementations of the host call table and the machinery that executes
//! what contracts schedule.
//!
//! - `InMemoryHost`: host for tests and local execution, with a world state
//! - `PromiseScheduler`: runs committed promise graphs on that host
//! - `WasmHost`: the real boundary crossing, `wasm32` only

pub mod contract_registry;
pub mod in_memory_host;
pub mod registers;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod wasm_host;
pub mod world;

pub use contract_registry::{ContractRegistry, MethodTable};
pub use in_memory_host::InMemoryHost;
pub use registers::RegisterFile;
pub use scheduler::{CallReport, PromiseScheduler, ReceiptExecution};
#[cfg(target_arch = "wasm32")]
pub use wasm_host::WasmHost;
pub use world::{AccessKey, AccountRecord, WorldState};
