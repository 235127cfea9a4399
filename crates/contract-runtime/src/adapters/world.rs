//! # World State
//!
//! Accounts, balances, access keys and contract storage of the in-memory
//! host, plus the validator set of the current epoch.
//!
//! Batch actions other than function calls are applied here. Function calls
//! only move their deposit; running code is the scheduler's job.

use crate::domain::entities::PromiseAction;
use crate::domain::value_objects::{AccountId, Amount, PublicKey};
use crate::errors::ActionError;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Permission attached to an access key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessKey {
    /// May sign any transaction.
    FullAccess {
        /// Replay protection counter.
        nonce: u64,
    },
    /// May only call `method_names` on `receiver_id`.
    FunctionCall {
        /// Replay protection counter.
        nonce: u64,
        /// Fee budget; `None` is unlimited.
        allowance: Option<Amount>,
        /// Only contract this key may call.
        receiver_id: AccountId,
        /// Callable methods; empty means any.
        method_names: Vec<String>,
    },
}

/// One account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountRecord {
    /// Liquid balance.
    pub balance: Amount,
    /// Staked balance.
    pub locked: Amount,
    /// Deployed code bytes, if any.
    pub code: Option<Vec<u8>>,
    /// Access keys.
    pub access_keys: HashMap<PublicKey, AccessKey>,
    /// Contract storage.
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl AccountRecord {
    /// Account holding `balance` and nothing else.
    #[must_use]
    pub fn with_balance(balance: Amount) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Bytes held in storage: key plus value plus `overhead` per record.
    #[must_use]
    pub fn storage_usage(&self, overhead: u64) -> u64 {
        self.storage
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64 + overhead)
            .sum()
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// Every account and validator known to the in-memory host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldState {
    accounts: BTreeMap<AccountId, AccountRecord>,
    validators: BTreeMap<AccountId, Amount>,
}

impl WorldState {
    /// Empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `account_id` with `balance`, or reset the balance of an
    /// existing account.
    pub fn create_account(&mut self, account_id: AccountId, balance: Amount) {
        self.accounts.entry(account_id).or_default().balance = balance;
    }

    /// Returns true if the account exists.
    #[must_use]
    pub fn contains(&self, account_id: &AccountId) -> bool {
        self.accounts.contains_key(account_id)
    }

    /// Look up an account.
    #[must_use]
    pub fn account(&self, account_id: &AccountId) -> Option<&AccountRecord> {
        self.accounts.get(account_id)
    }

    /// Look up an account for mutation.
    pub fn account_mut(&mut self, account_id: &AccountId) -> Option<&mut AccountRecord> {
        self.accounts.get_mut(account_id)
    }

    /// The account, created empty if missing.
    pub fn ensure_account(&mut self, account_id: &AccountId) -> &mut AccountRecord {
        self.accounts.entry(account_id.clone()).or_default()
    }

    /// Drop an account and everything it holds.
    pub fn remove_account(&mut self, account_id: &AccountId) {
        self.accounts.remove(account_id);
    }

    /// Liquid balance of an account, zero if it does not exist.
    #[must_use]
    pub fn balance(&self, account_id: &AccountId) -> Amount {
        self.account(account_id).map_or(Amount::ZERO, |a| a.balance)
    }

    /// Set a validator's stake; zero removes it.
    pub fn set_validator(&mut self, account_id: AccountId, stake: Amount) {
        if stake.is_zero() {
            self.validators.remove(&account_id);
        } else {
            self.validators.insert(account_id, stake);
        }
    }

    /// Stake of a validator, zero if not a validator.
    #[must_use]
    pub fn validator_stake(&self, account_id: &str) -> Amount {
        self.validators
            .get(&AccountId::from(account_id))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Sum of all validator stakes, saturating.
    #[must_use]
    pub fn validator_total_stake(&self) -> Amount {
        let total = self
            .validators
            .values()
            .map(Amount::as_u128)
            .fold(0u128, u128::saturating_add);
        Amount::new(total)
    }

    /// Add `amount` to an existing account.
    pub fn credit(&mut self, account_id: &AccountId, amount: Amount) -> Result<(), ActionError> {
        let record = self
            .account_mut(account_id)
            .ok_or_else(|| ActionError::AccountDoesNotExist(account_id.to_string()))?;
        record.balance = record
            .balance
            .checked_add(amount)
            .map_err(|_| ActionError::BalanceOverflow)?;
        Ok(())
    }

    /// Apply one action to `receiver_id`.
    ///
    /// Function calls only credit their deposit here.
    pub fn apply_action(
        &mut self,
        receiver_id: &AccountId,
        action: &PromiseAction,
    ) -> Result<(), ActionError> {
        debug!(receiver = %receiver_id, action = action.kind(), "Applying action");
        match action {
            PromiseAction::CreateAccount => {
                if self.contains(receiver_id) {
                    return Err(ActionError::AccountAlreadyExists(receiver_id.to_string()));
                }
                self.accounts
                    .insert(receiver_id.clone(), AccountRecord::default());
                Ok(())
            }
            PromiseAction::DeployContract { code } => {
                self.existing(receiver_id)?.code = Some(code.clone());
                Ok(())
            }
            PromiseAction::FunctionCall { deposit, .. }
            | PromiseAction::FunctionCallWeight { deposit, .. }
            | PromiseAction::Transfer { deposit } => self.credit(receiver_id, *deposit),
            PromiseAction::Stake { stake, .. } => {
                let record = self.existing(receiver_id)?;
                let total = record
                    .balance
                    .checked_add(record.locked)
                    .map_err(|_| ActionError::BalanceOverflow)?;
                if stake.as_u128() > total.as_u128() {
                    return Err(ActionError::InsufficientBalanceForStake {
                        stake: stake.as_u128(),
                        total: total.as_u128(),
                    });
                }
                record.locked = *stake;
                record.balance = Amount::new(total.as_u128() - stake.as_u128());
                self.set_validator(receiver_id.clone(), *stake);
                Ok(())
            }
            PromiseAction::AddFullAccessKey { public_key, nonce } => self.add_key(
                receiver_id,
                public_key,
                AccessKey::FullAccess { nonce: *nonce },
            ),
            PromiseAction::AddFunctionCallKey {
                public_key,
                nonce,
                allowance,
                receiver_id: key_receiver,
                method_names,
            } => self.add_key(
                receiver_id,
                public_key,
                AccessKey::FunctionCall {
                    nonce: *nonce,
                    allowance: *allowance,
                    receiver_id: key_receiver.clone(),
                    method_names: method_names.clone(),
                },
            ),
            PromiseAction::DeleteKey { public_key } => self
                .existing(receiver_id)?
                .access_keys
                .remove(public_key)
                .map(|_| ())
                .ok_or(ActionError::AccessKeyNotFound),
            PromiseAction::DeleteAccount { beneficiary_id } => {
                let record = self
                    .accounts
                    .remove(receiver_id)
                    .ok_or_else(|| ActionError::AccountDoesNotExist(receiver_id.to_string()))?;
                self.validators.remove(receiver_id);
                // Funds sent to a missing beneficiary are burnt
                if self.contains(beneficiary_id) {
                    self.credit(beneficiary_id, record.balance)?;
                }
                Ok(())
            }
        }
    }

    fn existing(&mut self, account_id: &AccountId) -> Result<&mut AccountRecord, ActionError> {
        self.accounts
            .get_mut(account_id)
            .ok_or_else(|| ActionError::AccountDoesNotExist(account_id.to_string()))
    }

    fn add_key(
        &mut self,
        account_id: &AccountId,
        public_key: &PublicKey,
        key: AccessKey,
    ) -> Result<(), ActionError> {
        let keys = &mut self.existing(account_id)?.access_keys;
        if keys.contains_key(public_key) {
            return Err(ActionError::AccessKeyAlreadyExists);
        }
        keys.insert(public_key.clone(), key);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
