//! # Driving Ports (API - Inbound)
//!
//! How contract code is exposed to the runtime: a module answers method
//! names with a body that runs against the binding layer.

use crate::env::Env;
use crate::errors::HostResult;
use crate::ports::outbound::HostApi;

/// Body of one exported method.
pub type MethodBody<H> = dyn Fn(&mut Env<'_, H>) -> HostResult<()>;

/// A deployed contract, seen from the runtime.
pub trait ContractModule<H: HostApi> {
    /// Returns true if `method` is exported.
    fn has_method(&self, method: &str) -> bool;

    /// Run `method`. Unknown methods trap.
    fn invoke_method(&self, method: &str, env: &mut Env<'_, H>) -> HostResult<()>;
}
