//! # Binding Layer
//!
//! Typed access to the host call table for one invocation.
//!
//! [`Env`] borrows the host for the duration of the invocation; the host is
//! injected, never global, so independent invocations stay isolated.
//!
//! | Component | File |
//! |-----------|------|
//! | Storage engine | `storage.rs` |
//! | Identity & context accessors | `context.rs` |
//! | Cryptographic primitives | `crypto.rs` |
//! | Promise graph builder | `promise.rs` |
//! | Batch action composer | `batch.rs` |
//! | Logging & termination | `logging.rs` |

mod batch;
mod context;
mod crypto;
mod logging;
mod promise;
mod storage;

pub use batch::BatchComposer;
pub use storage::STORAGE_BYTE_COST;

use crate::ports::outbound::HostApi;

/// Binding-layer handle for one invocation.
pub struct Env<'h, H: HostApi> {
    host: &'h mut H,
    /// Whether the most recent storage mutation evicted a value.
    last_mutation_evicted: bool,
}

impl<'h, H: HostApi> Env<'h, H> {
    /// Bind to a host for one invocation.
    pub fn new(host: &'h mut H) -> Self {
        Self {
            host,
            last_mutation_evicted: false,
        }
    }

    /// Direct access to the call table.
    pub fn host(&mut self) -> &mut H {
        &mut *self.host
    }
}
