//! # Contract Registry
//!
//! Native contract modules for the in-memory host. A module is a table of
//! named method bodies; the registry maps accounts to modules.

use crate::adapters::in_memory_host::InMemoryHost;
use crate::domain::value_objects::AccountId;
use crate::env::Env;
use crate::errors::{HostResult, Trap};
use crate::ports::inbound::{ContractModule, MethodBody};
use crate::ports::outbound::HostApi;
use std::collections::HashMap;

/// Contract made of closures, one per exported method.
pub struct MethodTable<H: HostApi> {
    name: String,
    methods: HashMap<String, Box<MethodBody<H>>>,
}

impl<H: HostApi> MethodTable<H> {
    /// Empty module; `name` only shows up in errors and logs.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Export `body` as `method`, replacing any previous body.
    #[must_use]
    pub fn method<F>(mut self, method: &str, body: F) -> Self
    where
        F: Fn(&mut Env<'_, H>) -> HostResult<()> + 'static,
    {
        self.methods.insert(method.to_string(), Box::new(body));
        self
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<H: HostApi> ContractModule<H> for MethodTable<H> {
    fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn invoke_method(&self, method: &str, env: &mut Env<'_, H>) -> HostResult<()> {
        let body = self.methods.get(method).ok_or_else(|| Trap::MethodNotFound {
            account_id: self.name.clone(),
            method: method.to_string(),
        })?;
        body(env)
    }
}

/// Modules deployed on the in-memory host, by account.
#[derive(Default)]
pub struct ContractRegistry {
    modules: HashMap<AccountId, Box<dyn ContractModule<InMemoryHost>>>,
}

impl ContractRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `module` on `account_id`, replacing what was there.
    pub fn deploy(
        &mut self,
        account_id: impl Into<AccountId>,
        module: impl ContractModule<InMemoryHost> + 'static,
    ) {
        self.modules.insert(account_id.into(), Box::new(module));
    }

    /// Module deployed on `account_id`.
    #[must_use]
    pub fn get(&self, account_id: &AccountId) -> Option<&dyn ContractModule<InMemoryHost>> {
        self.modules.get(account_id).map(|module| &**module)
    }

    /// Returns true if `account_id` has a module.
    #[must_use]
    pub fn contains(&self, account_id: &AccountId) -> bool {
        self.modules.contains_key(account_id)
    }
}
