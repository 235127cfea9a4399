//! # Identity & Context Accessors
//!
//! Read-only views of who is calling, where the code runs and what it may
//! spend. Using an accessor outside the context that defines it (signer or
//! deposit in a view call) traps in the host; nothing is validated here.

use super::Env;
use crate::channel::{fetch_array, fetch_required, fetch_text};
use crate::domain::value_objects::{AccountId, Amount, Gas, PublicKey, ATOMIC_OP_REGISTER};
use crate::errors::HostResult;
use crate::ports::outbound::HostApi;

impl<H: HostApi> Env<'_, H> {
    // =========================================================================
    // IDENTITY
    // =========================================================================

    /// Account that signed the originating transaction.
    pub fn signer_account_id(&mut self) -> HostResult<AccountId> {
        self.host.signer_account_id(ATOMIC_OP_REGISTER)?;
        fetch_text(self.host, ATOMIC_OP_REGISTER, "signer account id").map(AccountId::from)
    }

    /// Public key that signed the originating transaction.
    pub fn signer_account_pk(&mut self) -> HostResult<PublicKey> {
        self.host.signer_account_pk(ATOMIC_OP_REGISTER)?;
        let bytes = fetch_required(self.host, ATOMIC_OP_REGISTER)?;
        Ok(PublicKey::try_from(bytes.as_slice())?)
    }

    /// Immediate caller.
    pub fn predecessor_account_id(&mut self) -> HostResult<AccountId> {
        self.host.predecessor_account_id(ATOMIC_OP_REGISTER)?;
        fetch_text(self.host, ATOMIC_OP_REGISTER, "predecessor account id").map(AccountId::from)
    }

    /// Account whose code is running.
    pub fn current_account_id(&mut self) -> HostResult<AccountId> {
        self.host.current_account_id(ATOMIC_OP_REGISTER)?;
        fetch_text(self.host, ATOMIC_OP_REGISTER, "current account id").map(AccountId::from)
    }

    // =========================================================================
    // INPUT / OUTPUT
    // =========================================================================

    /// Call arguments.
    pub fn input_raw(&mut self) -> HostResult<Vec<u8>> {
        self.host.input(ATOMIC_OP_REGISTER)?;
        fetch_required(self.host, ATOMIC_OP_REGISTER)
    }

    /// Call arguments as text.
    pub fn input(&mut self) -> HostResult<String> {
        self.host.input(ATOMIC_OP_REGISTER)?;
        fetch_text(self.host, ATOMIC_OP_REGISTER, "input")
    }

    /// Set the return value.
    pub fn value_return_raw(&mut self, value: &[u8]) -> HostResult<()> {
        self.host.value_return(value)
    }

    /// Set a text return value.
    pub fn value_return(&mut self, value: &str) -> HostResult<()> {
        self.value_return_raw(value.as_bytes())
    }

    // =========================================================================
    // CHAIN
    // =========================================================================

    /// Current block height.
    pub fn block_index(&mut self) -> HostResult<u64> {
        self.host.block_index()
    }

    /// Alias of [`Self::block_index`].
    pub fn block_height(&mut self) -> HostResult<u64> {
        self.block_index()
    }

    /// Block timestamp in nanoseconds.
    pub fn block_timestamp(&mut self) -> HostResult<u64> {
        self.host.block_timestamp()
    }

    /// Current epoch.
    pub fn epoch_height(&mut self) -> HostResult<u64> {
        self.host.epoch_height()
    }

    /// 32-byte random seed of this invocation.
    pub fn random_seed(&mut self) -> HostResult<[u8; 32]> {
        self.host.random_seed(ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    // =========================================================================
    // BALANCES & GAS
    // =========================================================================

    /// Value attached to this call.
    pub fn attached_deposit(&mut self) -> HostResult<Amount> {
        self.host.attached_deposit().map(Amount::new)
    }

    /// Balance of the current account.
    pub fn account_balance(&mut self) -> HostResult<Amount> {
        self.host.account_balance().map(Amount::new)
    }

    /// Locked balance of the current account.
    pub fn account_locked_balance(&mut self) -> HostResult<Amount> {
        self.host.account_locked_balance().map(Amount::new)
    }

    /// Gas budget.
    pub fn prepaid_gas(&mut self) -> HostResult<Gas> {
        self.host.prepaid_gas().map(Gas::new)
    }

    /// Gas burnt so far.
    pub fn used_gas(&mut self) -> HostResult<Gas> {
        self.host.used_gas().map(Gas::new)
    }

    /// Stake of a validator; zero if `account_id` is not one.
    pub fn validator_stake(&mut self, account_id: &AccountId) -> HostResult<Amount> {
        self.host.validator_stake(account_id.as_str()).map(Amount::new)
    }

    /// Total validator stake.
    pub fn validator_total_stake(&mut self) -> HostResult<Amount> {
        self.host.validator_total_stake().map(Amount::new)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::adapters::InMemoryHost;
    use crate::domain::entities::InvocationContext;
    use crate::domain::value_objects::{AccountId, Amount, CurveType, Gas, PublicKey};
    use crate::env::Env;
    use crate::errors::Trap;
    use crate::ports::outbound::HostLifecycle;

    fn signer_key() -> PublicKey {
        PublicKey::new(CurveType::Ed25519, vec![9u8; 32]).unwrap()
    }

    fn call_context() -> InvocationContext {
        InvocationContext::new("dapp.test", "relay.test")
            .with_signer("alice.test", signer_key())
            .with_input(b"{\"n\":1}".to_vec())
            .with_deposit(Amount::new(7))
            .with_prepaid_gas(Gas::from_tgas(10))
            .with_block(42, 1_700_000_000_000_000_000, 3)
    }

    #[test]
    fn test_identity_accessors() {
        let mut host = InMemoryHost::new();
        host.begin(call_context());
        let mut env = Env::new(&mut host);

        assert_eq!(env.current_account_id().unwrap().as_str(), "dapp.test");
        assert_eq!(env.predecessor_account_id().unwrap().as_str(), "relay.test");
        assert_eq!(env.signer_account_id().unwrap().as_str(), "alice.test");
        assert_eq!(env.signer_account_pk().unwrap(), signer_key());
    }

    #[test]
    fn test_input_and_chain_metadata() {
        let mut host = InMemoryHost::new();
        host.begin(call_context());
        let mut env = Env::new(&mut host);

        assert_eq!(env.input().unwrap(), "{\"n\":1}");
        assert_eq!(env.input_raw().unwrap(), b"{\"n\":1}");
        assert_eq!(env.block_index().unwrap(), 42);
        assert_eq!(env.block_height().unwrap(), 42);
        assert_eq!(env.block_timestamp().unwrap(), 1_700_000_000_000_000_000);
        assert_eq!(env.epoch_height().unwrap(), 3);
        assert_eq!(env.random_seed().unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_balances_and_gas() {
        let mut host = InMemoryHost::new();
        host.create_account(AccountId::from("dapp.test"), Amount::new(1_000));
        host.set_validator(AccountId::from("v1.test"), Amount::new(300));
        host.set_validator(AccountId::from("v2.test"), Amount::new(700));
        host.begin(call_context());
        let mut env = Env::new(&mut host);

        assert_eq!(env.attached_deposit().unwrap(), Amount::new(7));
        assert_eq!(env.account_balance().unwrap(), Amount::new(1_000));
        assert_eq!(env.account_locked_balance().unwrap(), Amount::ZERO);
        assert_eq!(env.prepaid_gas().unwrap(), Gas::from_tgas(10));
        assert!(env.used_gas().unwrap() > Gas::ZERO);
        assert_eq!(
            env.validator_stake(&AccountId::from("v1.test")).unwrap(),
            Amount::new(300)
        );
        assert_eq!(
            env.validator_stake(&AccountId::from("nobody.test")).unwrap(),
            Amount::ZERO
        );
        assert_eq!(env.validator_total_stake().unwrap(), Amount::new(1_000));
    }

    #[test]
    fn test_view_call_prohibits_caller_identity() {
        let mut host = InMemoryHost::new();
        host.begin(InvocationContext::new("dapp.test", "alice.test").view());
        let mut env = Env::new(&mut host);

        assert_eq!(env.current_account_id().unwrap().as_str(), "dapp.test");
        assert_eq!(
            env.signer_account_id(),
            Err(Trap::ProhibitedInView {
                call: "signer_account_id"
            })
        );
        assert_eq!(
            env.predecessor_account_id(),
            Err(Trap::ProhibitedInView {
                call: "predecessor_account_id"
            })
        );
        assert_eq!(
            env.attached_deposit(),
            Err(Trap::ProhibitedInView {
                call: "attached_deposit"
            })
        );
        assert_eq!(
            env.prepaid_gas(),
            Err(Trap::ProhibitedInView { call: "prepaid_gas" })
        );
    }

    #[test]
    fn test_value_return() {
        let mut host = InMemoryHost::new();
        host.begin(InvocationContext::new("dapp.test", "alice.test"));
        Env::new(&mut host).value_return("Hi").unwrap();
        let effects = host.commit().unwrap();
        assert_eq!(
            effects.return_data,
            crate::domain::entities::ReturnData::Value(b"Hi".to_vec())
        );
    }
}
