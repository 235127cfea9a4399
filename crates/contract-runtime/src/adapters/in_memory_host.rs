//! # In-Memory Host
//!
//! Complete implementation of the host call table over a [`WorldState`].
//!
//! Each invocation gets a fresh register file, gas meter and promise graph.
//! Storage writes go straight to the current account and are undone from a
//! snapshot on rollback. Deposits attached to promises are reserved while the
//! invocation runs and leave the balance only on commit.
//!
//! The first trap raised by a host call is latched: every later call raises
//! it again and the invocation can no longer commit, even if the contract
//! discarded the error.

use crate::adapters::registers::RegisterFile;
use crate::adapters::world::{AccountRecord, WorldState};
use crate::config::RuntimeConfig;
use crate::domain::entities::{
    AbortedInvocation, InvocationContext, InvocationEffects, PromiseAction, PromiseOutcome,
    ReturnData,
};
use crate::domain::gas::{linear_cost, GasMeter, GasSchedule};
use crate::domain::invariants::check_all_invariants;
use crate::domain::promise_graph::PromiseGraph;
use crate::domain::value_objects::{AccountId, Amount, Gas, GasWeight, PromiseIndex, PublicKey};
use crate::errors::{HostResult, Trap};
use crate::ports::outbound::{HostApi, HostLifecycle};
use crate::telemetry::CONTRACT_LOG_TARGET;
use shared_crypto::alt_bn128::{MULTIEXP_ITEM_LEN, PAIRING_ITEM_LEN, SUM_ITEM_LEN};
use std::collections::BTreeMap;
use std::mem;
use tracing::{debug, info};

// =============================================================================
// ACTIVE INVOCATION
// =============================================================================

/// State that lives exactly as long as one invocation.
#[derive(Debug)]
struct ActiveInvocation {
    context: InvocationContext,
    registers: RegisterFile,
    meter: GasMeter,
    promises: PromiseGraph,
    return_data: ReturnData,
    logs: Vec<String>,
    reserved_deposits: Amount,
    /// Storage of the current account before the invocation; `None` if the
    /// account did not exist.
    storage_snapshot: Option<BTreeMap<Vec<u8>, Vec<u8>>>,
    trap: Option<Trap>,
}

impl ActiveInvocation {
    fn new(
        context: InvocationContext,
        storage_snapshot: Option<BTreeMap<Vec<u8>, Vec<u8>>>,
    ) -> Self {
        Self {
            meter: GasMeter::new(context.prepaid_gas),
            context,
            registers: RegisterFile::new(),
            promises: PromiseGraph::new(),
            return_data: ReturnData::None,
            logs: Vec::new(),
            reserved_deposits: Amount::ZERO,
            storage_snapshot,
            trap: None,
        }
    }
}

impl Default for ActiveInvocation {
    fn default() -> Self {
        Self::new(InvocationContext::default(), None)
    }
}

// =============================================================================
// HOST
// =============================================================================

/// Host for tests and local execution.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    config: RuntimeConfig,
    world: WorldState,
    active: ActiveInvocation,
}

impl InMemoryHost {
    /// Host with the default configuration and an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with a custom configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Accounts and validators.
    #[must_use]
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Accounts and validators, for applying actions between invocations.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Create or refund an account.
    pub fn create_account(&mut self, account_id: AccountId, balance: Amount) {
        self.world.create_account(account_id, balance);
    }

    /// Register a validator for the current epoch.
    pub fn set_validator(&mut self, account_id: AccountId, stake: Amount) {
        self.world.set_validator(account_id, stake);
    }

    /// Stored value of an account, outside any invocation.
    #[must_use]
    pub fn storage_value(&self, account_id: &AccountId, key: &[u8]) -> Option<&[u8]> {
        self.world
            .account(account_id)
            .and_then(|a| a.storage.get(key))
            .map(Vec::as_slice)
    }

    /// First trap raised in the current invocation, if any.
    #[must_use]
    pub fn raised_trap(&self) -> Option<&Trap> {
        self.active.trap.as_ref()
    }

    /// Run one host call, latching the first trap it raises.
    fn sticky<T>(&mut self, call: impl FnOnce(&mut Self) -> HostResult<T>) -> HostResult<T> {
        if let Some(trap) = &self.active.trap {
            return Err(trap.clone());
        }
        let result = call(self);
        if let Err(trap) = &result {
            self.latch(trap.clone());
        }
        result
    }

    fn latch(&mut self, trap: Trap) {
        if self.active.trap.is_none() {
            debug!(%trap, "Trap latched");
            self.active.trap = Some(trap);
        }
    }

    fn gas(&self) -> &GasSchedule {
        &self.config.gas
    }

    fn charge(&mut self, amount: u64) -> HostResult<()> {
        self.active.meter.charge(amount)
    }

    fn deny_in_view(&self, call: &'static str) -> HostResult<()> {
        if self.active.context.is_view {
            return Err(Trap::ProhibitedInView { call });
        }
        Ok(())
    }

    fn write_register(&mut self, register_id: u64, bytes: Vec<u8>) -> HostResult<()> {
        let cost = linear_cost(0, self.gas().write_register_byte, bytes.len());
        self.charge(cost)?;
        self.active.registers.write(register_id, bytes);
        Ok(())
    }

    fn current_account(&self) -> Option<&AccountRecord> {
        self.world.account(&self.active.context.current_account_id)
    }

    /// The current account, created on first storage write.
    fn current_account_mut(&mut self) -> &mut AccountRecord {
        self.world
            .ensure_account(&self.active.context.current_account_id)
    }

    fn check_key(&self, key: &[u8]) -> HostResult<()> {
        let limit = self.config.limits.max_key_len;
        if key.len() as u64 > limit {
            return Err(Trap::KeyLengthExceeded {
                length: key.len() as u64,
                limit,
            });
        }
        Ok(())
    }

    fn record_log(&mut self, message: String, byte_len: usize) -> HostResult<()> {
        let limits = &self.config.limits;
        if self.active.logs.len() as u64 >= limits.max_logs {
            return Err(Trap::NumberOfLogsExceeded {
                limit: limits.max_logs,
            });
        }
        if byte_len as u64 > limits.max_log_len {
            return Err(Trap::LogLengthExceeded {
                length: byte_len as u64,
                limit: limits.max_log_len,
            });
        }
        let cost = linear_cost(self.gas().log_base, self.gas().log_byte, byte_len);
        self.charge(cost)?;
        info!(
            target: CONTRACT_LOG_TARGET,
            account = %self.active.context.current_account_id,
            "{message}"
        );
        self.active.logs.push(message);
        Ok(())
    }

    fn reserve_deposit(&mut self, deposit: Amount) -> HostResult<()> {
        if deposit.is_zero() {
            return Ok(());
        }
        let needed = self.active.reserved_deposits.checked_add(deposit)?;
        let available = self
            .world
            .balance(&self.active.context.current_account_id);
        if needed > available {
            return Err(Trap::BalanceExceeded {
                needed: needed.as_u128(),
                available: available.as_u128(),
            });
        }
        self.active.reserved_deposits = needed;
        Ok(())
    }

    fn new_receipt(&mut self, call: &'static str, receiver: &str, after: Option<u64>) -> HostResult<u64> {
        self.deny_in_view(call)?;
        self.charge(self.gas().promise_base)?;
        let index = self
            .active
            .promises
            .create_receipt(AccountId::from(receiver), after.map(PromiseIndex::from_raw))?;
        Ok(index.as_raw())
    }

    /// Receipt holding a single function call; nothing is added to the graph
    /// unless the call can be paid for.
    fn new_call_receipt(
        &mut self,
        call: &'static str,
        receiver: &str,
        after: Option<u64>,
        action: PromiseAction,
    ) -> HostResult<u64> {
        self.deny_in_view(call)?;
        if let Some(after) = after {
            self.active.promises.get(PromiseIndex::from_raw(after))?;
        }
        self.charge(self.gas().promise_base)?;
        self.pay_for_action(&action)?;
        let index = self
            .active
            .promises
            .create_receipt(AccountId::from(receiver), after.map(PromiseIndex::from_raw))?;
        self.active.promises.append_action(index, action)?;
        Ok(index.as_raw())
    }

    fn schedule_action(
        &mut self,
        call: &'static str,
        promise_index: u64,
        action: PromiseAction,
    ) -> HostResult<()> {
        self.deny_in_view(call)?;
        let index = PromiseIndex::from_raw(promise_index);
        self.active.promises.check_receipt(index)?;
        self.pay_for_action(&action)?;
        self.active.promises.append_action(index, action)
    }

    fn pay_for_action(&mut self, action: &PromiseAction) -> HostResult<()> {
        self.charge(self.gas().action_base)?;
        self.charge(action.attached_gas().as_u64())?;
        self.reserve_deposit(action.attached_deposit())
    }

    fn hash_into(
        &mut self,
        value: &[u8],
        register_id: u64,
        digest: impl FnOnce(&[u8]) -> Vec<u8>,
    ) -> HostResult<()> {
        let cost = linear_cost(self.gas().hash_base, self.gas().hash_byte, value.len());
        self.charge(cost)?;
        self.write_register(register_id, digest(value))
    }

    fn charge_curve(&mut self, len: usize, item_len: usize) -> HostResult<()> {
        let cost = linear_cost(
            self.gas().alt_bn128_base,
            self.gas().alt_bn128_item,
            len / item_len,
        );
        self.charge(cost)
    }
}

fn parse_public_key(bytes: &[u8]) -> HostResult<PublicKey> {
    Ok(PublicKey::try_from(bytes)?)
}

// =============================================================================
// HOST CALL TABLE
// =============================================================================

impl HostApi for InMemoryHost {
    fn read_register(&mut self, register_id: u64) -> HostResult<Vec<u8>> {
        self.sticky(|host| {
            let bytes = host.active.registers.read(register_id)?.to_vec();
            let cost = linear_cost(host.gas().base, host.gas().read_register_byte, bytes.len());
            host.charge(cost)?;
            Ok(bytes)
        })
    }

    fn register_len(&mut self, register_id: u64) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.active.registers.len(register_id).unwrap_or(u64::MAX))
        })
    }

    fn current_account_id(&mut self, register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            let id = host.active.context.current_account_id.as_str().as_bytes().to_vec();
            host.write_register(register_id, id)
        })
    }

    fn signer_account_id(&mut self, register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.deny_in_view("signer_account_id")?;
            host.charge(host.gas().base)?;
            let id = host.active.context.signer_account_id.as_str().as_bytes().to_vec();
            host.write_register(register_id, id)
        })
    }

    fn signer_account_pk(&mut self, register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.deny_in_view("signer_account_pk")?;
            host.charge(host.gas().base)?;
            let pk = host.active.context.signer_account_pk.to_bytes();
            host.write_register(register_id, pk)
        })
    }

    fn predecessor_account_id(&mut self, register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.deny_in_view("predecessor_account_id")?;
            host.charge(host.gas().base)?;
            let id = host
                .active
                .context
                .predecessor_account_id
                .as_str()
                .as_bytes()
                .to_vec();
            host.write_register(register_id, id)
        })
    }

    fn input(&mut self, register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            let input = host.active.context.input.clone();
            host.write_register(register_id, input)
        })
    }

    fn block_index(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.active.context.block_index)
        })
    }

    fn block_timestamp(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.active.context.block_timestamp)
        })
    }

    fn epoch_height(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.active.context.epoch_height)
        })
    }

    fn storage_usage(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            let overhead = host.config.storage_record_overhead;
            Ok(host
                .current_account()
                .map_or(0, |account| account.storage_usage(overhead)))
        })
    }

    fn account_balance(&mut self) -> HostResult<u128> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            let balance = host.current_account().map_or(0, |a| a.balance.as_u128());
            Ok(balance.saturating_sub(host.active.reserved_deposits.as_u128()))
        })
    }

    fn account_locked_balance(&mut self) -> HostResult<u128> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.current_account().map_or(0, |a| a.locked.as_u128()))
        })
    }

    fn attached_deposit(&mut self) -> HostResult<u128> {
        self.sticky(|host| {
            host.deny_in_view("attached_deposit")?;
            host.charge(host.gas().base)?;
            Ok(host.active.context.attached_deposit.as_u128())
        })
    }

    fn prepaid_gas(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("prepaid_gas")?;
            host.charge(host.gas().base)?;
            Ok(host.active.meter.prepaid().as_u64())
        })
    }

    fn used_gas(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("used_gas")?;
            host.charge(host.gas().base)?;
            Ok(host.active.meter.used().as_u64())
        })
    }

    fn random_seed(&mut self, register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            let seed = host.active.context.random_seed.clone();
            host.write_register(register_id, seed)
        })
    }

    fn validator_stake(&mut self, account_id: &str) -> HostResult<u128> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.world.validator_stake(account_id).as_u128())
        })
    }

    fn validator_total_stake(&mut self) -> HostResult<u128> {
        self.sticky(|host| {
            host.charge(host.gas().base)?;
            Ok(host.world.validator_total_stake().as_u128())
        })
    }

    // =========================================================================
    // CRYPTOGRAPHY
    // =========================================================================

    fn sha256(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.hash_into(value, register_id, |v| shared_crypto::sha256(v).to_vec())
        })
    }

    fn keccak256(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.hash_into(value, register_id, |v| shared_crypto::keccak256(v).to_vec())
        })
    }

    fn keccak512(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.hash_into(value, register_id, |v| shared_crypto::keccak512(v).to_vec())
        })
    }

    fn ripemd160(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.hash_into(value, register_id, |v| shared_crypto::ripemd160(v).to_vec())
        })
    }

    fn ecrecover(
        &mut self,
        hash: &[u8],
        signature: &[u8],
        v: u64,
        malleability_flag: u64,
        register_id: u64,
    ) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge(host.gas().ecrecover_base)?;
            let recovered = shared_crypto::ecrecover(hash, signature, v, malleability_flag)
                .map_err(|e| Trap::from_crypto("ecrecover", e))?;
            match recovered {
                Some(public_key) => {
                    host.write_register(register_id, public_key.to_vec())?;
                    Ok(1)
                }
                None => Ok(0),
            }
        })
    }

    fn alt_bn128_g1_multiexp(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.charge_curve(value.len(), MULTIEXP_ITEM_LEN)?;
            let point = shared_crypto::g1_multiexp(value)
                .map_err(|e| Trap::from_crypto("alt_bn128_g1_multiexp", e))?;
            host.write_register(register_id, point.to_vec())
        })
    }

    fn alt_bn128_g1_sum(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.charge_curve(value.len(), SUM_ITEM_LEN)?;
            let point = shared_crypto::g1_sum(value)
                .map_err(|e| Trap::from_crypto("alt_bn128_g1_sum", e))?;
            host.write_register(register_id, point.to_vec())
        })
    }

    fn alt_bn128_pairing_check(&mut self, value: &[u8]) -> HostResult<u64> {
        self.sticky(|host| {
            host.charge_curve(value.len(), PAIRING_ITEM_LEN)?;
            let holds = shared_crypto::pairing_check(value)
                .map_err(|e| Trap::from_crypto("alt_bn128_pairing_check", e))?;
            Ok(u64::from(holds))
        })
    }

    // =========================================================================
    // MISC
    // =========================================================================

    fn value_return(&mut self, value: &[u8]) -> HostResult<()> {
        self.sticky(|host| {
            let cost = linear_cost(host.gas().base, host.gas().read_register_byte, value.len());
            host.charge(cost)?;
            host.active.promises.clear_returned();
            host.active.return_data = ReturnData::Value(value.to_vec());
            Ok(())
        })
    }

    fn panic_utf8(&mut self, message: &[u8]) -> Trap {
        let charged = self.sticky(|host| host.charge(host.gas().base));
        let trap = match (charged, std::str::from_utf8(message)) {
            (Err(trap), _) => trap,
            (Ok(()), Ok(text)) => Trap::Panic(text.to_string()),
            (Ok(()), Err(_)) => Trap::InvalidUtf8 {
                context: "panic message",
            },
        };
        self.latch(trap.clone());
        trap
    }

    fn log_utf8(&mut self, message: &[u8]) -> HostResult<()> {
        self.sticky(|host| {
            let text = std::str::from_utf8(message)
                .map_err(|_| Trap::InvalidUtf8 {
                    context: "log message",
                })?
                .to_string();
            host.record_log(text, message.len())
        })
    }

    fn log_utf16(&mut self, message: &[u8]) -> HostResult<()> {
        self.sticky(|host| {
            if message.len() % 2 != 0 {
                return Err(Trap::InvalidUtf16);
            }
            let units: Vec<u16> = message
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            let text = String::from_utf16(&units).map_err(|_| Trap::InvalidUtf16)?;
            host.record_log(text, message.len())
        })
    }

    // =========================================================================
    // PROMISES
    // =========================================================================

    fn promise_create(
        &mut self,
        account_id: &str,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<u64> {
        self.sticky(|host| {
            host.new_call_receipt(
                "promise_create",
                account_id,
                None,
                PromiseAction::FunctionCall {
                    method_name: method_name.to_string(),
                    arguments: arguments.to_vec(),
                    deposit: Amount::new(amount),
                    gas: Gas::new(gas),
                },
            )
        })
    }

    fn promise_then(
        &mut self,
        promise_index: u64,
        account_id: &str,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<u64> {
        self.sticky(|host| {
            host.new_call_receipt(
                "promise_then",
                account_id,
                Some(promise_index),
                PromiseAction::FunctionCall {
                    method_name: method_name.to_string(),
                    arguments: arguments.to_vec(),
                    deposit: Amount::new(amount),
                    gas: Gas::new(gas),
                },
            )
        })
    }

    fn promise_and(&mut self, promise_indices: &[u64]) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("promise_and")?;
            host.charge(host.gas().promise_base)?;
            let indices: Vec<PromiseIndex> = promise_indices
                .iter()
                .copied()
                .map(PromiseIndex::from_raw)
                .collect();
            Ok(host.active.promises.join(&indices)?.as_raw())
        })
    }

    fn promise_batch_create(&mut self, account_id: &str) -> HostResult<u64> {
        self.sticky(|host| {
            host.new_receipt("promise_batch_create", account_id, None)
        })
    }

    fn promise_batch_then(&mut self, promise_index: u64, account_id: &str) -> HostResult<u64> {
        self.sticky(|host| {
            host.new_receipt("promise_batch_then", account_id, Some(promise_index))
        })
    }

    fn promise_results_count(&mut self) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("promise_results_count")?;
            host.charge(host.gas().base)?;
            Ok(host.active.context.promise_results.len() as u64)
        })
    }

    fn promise_result(&mut self, result_idx: u64, register_id: u64) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("promise_result")?;
            host.charge(host.gas().base)?;
            let results = &host.active.context.promise_results;
            let outcome = usize::try_from(result_idx)
                .ok()
                .and_then(|i| results.get(i))
                .cloned()
                .ok_or(Trap::PromiseResultOutOfBounds {
                    index: result_idx,
                    count: results.len() as u64,
                })?;
            let status = outcome.status().code();
            if let PromiseOutcome::Successful(bytes) = outcome {
                host.write_register(register_id, bytes)?;
            }
            Ok(status)
        })
    }

    fn promise_return(&mut self, promise_index: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.deny_in_view("promise_return")?;
            host.charge(host.gas().base)?;
            let index = PromiseIndex::from_raw(promise_index);
            host.active.promises.set_returned(index)?;
            host.active.return_data = ReturnData::Promise(index);
            Ok(())
        })
    }

    // =========================================================================
    // BATCH ACTIONS
    // =========================================================================

    fn promise_batch_action_create_account(&mut self, promise_index: u64) -> HostResult<()> {
        self.sticky(|host| {
            host.schedule_action(
                "promise_batch_action_create_account",
                promise_index,
                PromiseAction::CreateAccount,
            )
        })
    }

    fn promise_batch_action_deploy_contract(
        &mut self,
        promise_index: u64,
        code: &[u8],
    ) -> HostResult<()> {
        self.sticky(|host| {
            host.schedule_action(
                "promise_batch_action_deploy_contract",
                promise_index,
                PromiseAction::DeployContract {
                    code: code.to_vec(),
                },
            )
        })
    }

    fn promise_batch_action_function_call(
        &mut self,
        promise_index: u64,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<()> {
        self.sticky(|host| {
            host.schedule_action(
                "promise_batch_action_function_call",
                promise_index,
                PromiseAction::FunctionCall {
                    method_name: method_name.to_string(),
                    arguments: arguments.to_vec(),
                    deposit: Amount::new(amount),
                    gas: Gas::new(gas),
                },
            )
        })
    }

    fn promise_batch_action_function_call_weight(
        &mut self,
        promise_index: u64,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
        weight: u64,
    ) -> HostResult<()> {
        self.sticky(|host| {
            host.schedule_action(
                "promise_batch_action_function_call_weight",
                promise_index,
                PromiseAction::FunctionCallWeight {
                    method_name: method_name.to_string(),
                    arguments: arguments.to_vec(),
                    deposit: Amount::new(amount),
                    gas: Gas::new(gas),
                    weight: GasWeight(weight),
                },
            )
        })
    }

    fn promise_batch_action_transfer(&mut self, promise_index: u64, amount: u128) -> HostResult<()> {
        self.sticky(|host| {
            host.schedule_action(
                "promise_batch_action_transfer",
                promise_index,
                PromiseAction::Transfer {
                    deposit: Amount::new(amount),
                },
            )
        })
    }

    fn promise_batch_action_stake(
        &mut self,
        promise_index: u64,
        amount: u128,
        public_key: &[u8],
    ) -> HostResult<()> {
        self.sticky(|host| {
            let public_key = parse_public_key(public_key)?;
            host.schedule_action(
                "promise_batch_action_stake",
                promise_index,
                PromiseAction::Stake {
                    stake: Amount::new(amount),
                    public_key,
                },
            )
        })
    }

    fn promise_batch_action_add_key_with_full_access(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
        nonce: u64,
    ) -> HostResult<()> {
        self.sticky(|host| {
            let public_key = parse_public_key(public_key)?;
            host.schedule_action(
                "promise_batch_action_add_key_with_full_access",
                promise_index,
                PromiseAction::AddFullAccessKey { public_key, nonce },
            )
        })
    }

    fn promise_batch_action_add_key_with_function_call(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
        nonce: u64,
        allowance: u128,
        receiver_id: &str,
        method_names: &str,
    ) -> HostResult<()> {
        self.sticky(|host| {
            let public_key = parse_public_key(public_key)?;
            let allowance = (allowance != 0).then(|| Amount::new(allowance));
            let method_names = method_names
                .split(',')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            host.schedule_action(
                "promise_batch_action_add_key_with_function_call",
                promise_index,
                PromiseAction::AddFunctionCallKey {
                    public_key,
                    nonce,
                    allowance,
                    receiver_id: AccountId::from(receiver_id),
                    method_names,
                },
            )
        })
    }

    fn promise_batch_action_delete_key(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
    ) -> HostResult<()> {
        self.sticky(|host| {
            let public_key = parse_public_key(public_key)?;
            host.schedule_action(
                "promise_batch_action_delete_key",
                promise_index,
                PromiseAction::DeleteKey { public_key },
            )
        })
    }

    fn promise_batch_action_delete_account(
        &mut self,
        promise_index: u64,
        beneficiary_id: &str,
    ) -> HostResult<()> {
        self.sticky(|host| {
            host.schedule_action(
                "promise_batch_action_delete_account",
                promise_index,
                PromiseAction::DeleteAccount {
                    beneficiary_id: AccountId::from(beneficiary_id),
                },
            )
        })
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    fn storage_write(&mut self, key: &[u8], value: &[u8], register_id: u64) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("storage_write")?;
            host.check_key(key)?;
            let limit = host.config.limits.max_value_len;
            if value.len() as u64 > limit {
                return Err(Trap::ValueLengthExceeded {
                    length: value.len() as u64,
                    limit,
                });
            }
            let gas = host.gas();
            let cost = linear_cost(gas.storage_write_base, gas.storage_write_key_byte, key.len())
                .saturating_add(gas.storage_write_value_byte.saturating_mul(value.len() as u64));
            host.charge(cost)?;

            let evicted = host
                .current_account_mut()
                .storage
                .insert(key.to_vec(), value.to_vec());
            match evicted {
                Some(evicted) => {
                    host.write_register(register_id, evicted)?;
                    Ok(1)
                }
                None => Ok(0),
            }
        })
    }

    fn storage_read(&mut self, key: &[u8], register_id: u64) -> HostResult<u64> {
        self.sticky(|host| {
            host.check_key(key)?;
            let cost = linear_cost(
                host.gas().storage_read_base,
                host.gas().storage_read_key_byte,
                key.len(),
            );
            host.charge(cost)?;

            let stored = host
                .current_account()
                .and_then(|a| a.storage.get(key))
                .cloned();
            match stored {
                Some(value) => {
                    let value_cost =
                        linear_cost(0, host.gas().storage_read_value_byte, value.len());
                    host.charge(value_cost)?;
                    host.write_register(register_id, value)?;
                    Ok(1)
                }
                None => Ok(0),
            }
        })
    }

    fn storage_remove(&mut self, key: &[u8], register_id: u64) -> HostResult<u64> {
        self.sticky(|host| {
            host.deny_in_view("storage_remove")?;
            host.check_key(key)?;
            host.charge(host.gas().storage_remove_base)?;

            let removed = host
                .world
                .account_mut(&host.active.context.current_account_id)
                .and_then(|a| a.storage.remove(key));
            match removed {
                Some(removed) => {
                    host.write_register(register_id, removed)?;
                    Ok(1)
                }
                None => Ok(0),
            }
        })
    }

    fn storage_has_key(&mut self, key: &[u8]) -> HostResult<u64> {
        self.sticky(|host| {
            host.check_key(key)?;
            host.charge(host.gas().storage_has_key_base)?;
            Ok(u64::from(
                host.current_account()
                    .is_some_and(|a| a.storage.contains_key(key)),
            ))
        })
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl HostLifecycle for InMemoryHost {
    fn begin(&mut self, context: InvocationContext) {
        let snapshot = self
            .world
            .account(&context.current_account_id)
            .map(|account| account.storage.clone());
        debug!(
            account = %context.current_account_id,
            predecessor = %context.predecessor_account_id,
            view = context.is_view,
            "Invocation started"
        );
        self.active = ActiveInvocation::new(context, snapshot);
    }

    fn commit(&mut self) -> Result<InvocationEffects, AbortedInvocation> {
        if let Some(trap) = self.active.trap.clone() {
            return Err(self.rollback(trap));
        }
        let mut active = mem::take(&mut self.active);

        // Gas nobody burnt goes to weighted calls
        let distributed = active.promises.distribute_unused_gas(active.meter.remaining());
        let gas_used = Gas::new(
            active
                .meter
                .used()
                .as_u64()
                .saturating_add(distributed.as_u64()),
        );

        let account_id = active.context.current_account_id;
        let overhead = self.config.storage_record_overhead;
        let storage_usage = match self.world.account_mut(&account_id) {
            Some(record) => {
                record.balance = Amount::new(
                    record
                        .balance
                        .as_u128()
                        .saturating_sub(active.reserved_deposits.as_u128()),
                );
                record.storage_usage(overhead)
            }
            None => 0,
        };

        debug!(
            account = %account_id,
            gas_used = gas_used.as_u64(),
            promises = active.promises.len(),
            "Invocation committed"
        );
        let effects = InvocationEffects {
            account_id,
            return_data: active.return_data,
            logs: active.logs,
            gas_used,
            promises: active.promises,
            storage_usage,
        };
        debug_assert!(
            check_all_invariants(&effects, active.meter.prepaid()),
            "committed effects break an invocation invariant"
        );
        Ok(effects)
    }

    fn rollback(&mut self, trap: Trap) -> AbortedInvocation {
        let active = mem::take(&mut self.active);
        let account_id = active.context.current_account_id;
        match active.storage_snapshot {
            Some(storage) => {
                if let Some(record) = self.world.account_mut(&account_id) {
                    record.storage = storage;
                }
            }
            // Created by a storage write in this invocation
            None => self.world.remove_account(&account_id),
        }
        // The first trap is the one that aborted the contract
        let trap = active.trap.unwrap_or(trap);

        debug!(account = %account_id, %trap, "Invocation rolled back");
        AbortedInvocation {
            account_id,
            trap,
            logs: active.logs,
            gas_used: active.meter.used(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
