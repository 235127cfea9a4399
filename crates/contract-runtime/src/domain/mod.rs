//! # Domain Layer (Inner Hexagon)
//!
//! Pure types and rules of the binding layer.
//! NO I/O, NO host calls.
//!
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).

pub mod entities;
pub mod gas;
pub mod invariants;
pub mod promise_graph;
pub mod value_objects;

pub use entities::*;
pub use gas::*;
pub use invariants::*;
pub use promise_graph::*;
pub use value_objects::*;
