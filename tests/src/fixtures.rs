//! # Test Fixtures
//!
//! Hosts and contracts shared by the integration flows and benchmarks.

use contract_runtime::prelude::*;

/// Starting balance of every funded account.
pub const INITIAL_BALANCE: u128 = 1_000_000;

/// Account the key-value contract is deployed on.
pub const KV_ACCOUNT: &str = "kv.test";

/// Host with `accounts` created and funded.
pub fn funded_host(accounts: &[&str]) -> InMemoryHost {
    funded_host_with(RuntimeConfig::default(), accounts)
}

/// [`funded_host`] with an explicit configuration.
pub fn funded_host_with(config: RuntimeConfig, accounts: &[&str]) -> InMemoryHost {
    let mut host = InMemoryHost::with_config(config);
    for account in accounts {
        host.create_account((*account).into(), Amount::new(INITIAL_BALANCE));
    }
    host
}

/// Direct call from `alice.test`.
pub fn call_from_alice(receiver: &str) -> InvocationContext {
    InvocationContext::new(receiver, "alice.test")
}

/// Key-value store.
///
/// - `set`: input `key=value`, returns the replaced value (empty if none)
/// - `get`: input `key`, returns the value or nothing
/// - `remove`: input `key`
/// - `usage`: storage bytes as decimal text
/// - `set_then_fail`: writes `key=value`, then panics
pub fn kv_store() -> MethodTable<InMemoryHost> {
    MethodTable::new("kv")
        .method("set", |env| {
            let input = env.input()?;
            let Some((key, value)) = input.split_once('=') else {
                return Err(env.panic_str("expected key=value"));
            };
            let replaced = if env.storage_write(key, value)? {
                let old = env.storage_get_evicted()?.unwrap_or_default();
                env.log_str(&format!("replaced {old}"))?;
                old
            } else {
                String::new()
            };
            env.value_return(&replaced)
        })
        .method("get", |env| {
            let key = env.input()?;
            match env.storage_read(&key)? {
                Some(value) => env.value_return(&value),
                None => Ok(()),
            }
        })
        .method("remove", |env| {
            let key = env.input()?;
            env.storage_remove(&key).map(drop)
        })
        .method("usage", |env| {
            let usage = env.storage_usage()?;
            env.value_return(&usage.to_string())
        })
        .method("set_then_fail", |env| {
            let input = env.input()?;
            if let Some((key, value)) = input.split_once('=') {
                env.storage_write(key, value)?;
            }
            Err(env.panic_str("changed my mind"))
        })
}

/// Contract that returns its input as text with a prefix.
pub fn echo(prefix: &'static str) -> MethodTable<InMemoryHost> {
    MethodTable::new("echo").method("echo", move |env| {
        let input = env.input()?;
        env.value_return(&format!("{prefix}{input}"))
    })
}

/// Contract whose `relay` method forwards its input to `echo` on `next`
/// and returns that promise.
pub fn relay(next: &'static str) -> MethodTable<InMemoryHost> {
    MethodTable::new("relay").method("relay", move |env| {
        let input = env.input_raw()?;
        let gas = Gas::new(env.prepaid_gas()?.as_u64() / 2);
        let p = env.promise_create(&next.into(), "echo", &input, Amount::ZERO, gas)?;
        env.promise_return(p)
    })
}
