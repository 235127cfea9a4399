//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions at the edges of the binding layer.
//!
//! - **Driving Ports (Inbound)**: `ContractModule`
//! - **Driven Ports (Outbound)**: `HostApi`, `HostLifecycle`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
