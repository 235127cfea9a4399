//! # Wasm Host
//!
//! [`HostApi`] over the imports a `wasm32` contract receives from the VM.
//!
//! Every slice crosses the boundary as a `(len, ptr)` pair of `u64`s and
//! every 128-bit amount as a pointer to 16 little-endian bytes. Gas and
//! view-mode enforcement happen on the VM side: a violating call never
//! returns to the contract.

use crate::errors::{HostResult, Trap};
use crate::ports::outbound::HostApi;

#[allow(missing_docs)]
mod sys {
    extern "C" {
        // Registers
        pub fn read_register(register_id: u64, ptr: u64);
        pub fn register_len(register_id: u64) -> u64;

        // Context
        pub fn current_account_id(register_id: u64);
        pub fn signer_account_id(register_id: u64);
        pub fn signer_account_pk(register_id: u64);
        pub fn predecessor_account_id(register_id: u64);
        pub fn input(register_id: u64);
        pub fn block_index() -> u64;
        pub fn block_timestamp() -> u64;
        pub fn epoch_height() -> u64;
        pub fn storage_usage() -> u64;
        pub fn account_balance(balance_ptr: u64);
        pub fn account_locked_balance(balance_ptr: u64);
        pub fn attached_deposit(balance_ptr: u64);
        pub fn prepaid_gas() -> u64;
        pub fn used_gas() -> u64;
        pub fn random_seed(register_id: u64);
        pub fn validator_stake(account_id_len: u64, account_id_ptr: u64, stake_ptr: u64);
        pub fn validator_total_stake(stake_ptr: u64);

        // Cryptography
        pub fn sha256(value_len: u64, value_ptr: u64, register_id: u64);
        pub fn keccak256(value_len: u64, value_ptr: u64, register_id: u64);
        pub fn keccak512(value_len: u64, value_ptr: u64, register_id: u64);
        pub fn ripemd160(value_len: u64, value_ptr: u64, register_id: u64);
        pub fn ecrecover(
            hash_len: u64,
            hash_ptr: u64,
            sig_len: u64,
            sig_ptr: u64,
            v: u64,
            malleability_flag: u64,
            register_id: u64,
        ) -> u64;
        pub fn alt_bn128_g1_multiexp(value_len: u64, value_ptr: u64, register_id: u64);
        pub fn alt_bn128_g1_sum(value_len: u64, value_ptr: u64, register_id: u64);
        pub fn alt_bn128_pairing_check(value_len: u64, value_ptr: u64) -> u64;

        // Misc
        pub fn value_return(value_len: u64, value_ptr: u64);
        pub fn panic_utf8(len: u64, ptr: u64) -> !;
        pub fn log_utf8(len: u64, ptr: u64);
        pub fn log_utf16(len: u64, ptr: u64);

        // Promises
        pub fn promise_create(
            account_id_len: u64,
            account_id_ptr: u64,
            method_name_len: u64,
            method_name_ptr: u64,
            arguments_len: u64,
            arguments_ptr: u64,
            amount_ptr: u64,
            gas: u64,
        ) -> u64;
        pub fn promise_then(
            promise_index: u64,
            account_id_len: u64,
            account_id_ptr: u64,
            method_name_len: u64,
            method_name_ptr: u64,
            arguments_len: u64,
            arguments_ptr: u64,
            amount_ptr: u64,
            gas: u64,
        ) -> u64;
        pub fn promise_and(promise_idx_ptr: u64, promise_idx_count: u64) -> u64;
        pub fn promise_batch_create(account_id_len: u64, account_id_ptr: u64) -> u64;
        pub fn promise_batch_then(
            promise_index: u64,
            account_id_len: u64,
            account_id_ptr: u64,
        ) -> u64;
        pub fn promise_results_count() -> u64;
        pub fn promise_result(result_idx: u64, register_id: u64) -> u64;
        pub fn promise_return(promise_index: u64);

        // Batch actions
        pub fn promise_batch_action_create_account(promise_index: u64);
        pub fn promise_batch_action_deploy_contract(promise_index: u64, code_len: u64, code_ptr: u64);
        pub fn promise_batch_action_function_call(
            promise_index: u64,
            method_name_len: u64,
            method_name_ptr: u64,
            arguments_len: u64,
            arguments_ptr: u64,
            amount_ptr: u64,
            gas: u64,
        );
        pub fn promise_batch_action_function_call_weight(
            promise_index: u64,
            method_name_len: u64,
            method_name_ptr: u64,
            arguments_len: u64,
            arguments_ptr: u64,
            amount_ptr: u64,
            gas: u64,
            weight: u64,
        );
        pub fn promise_batch_action_transfer(promise_index: u64, amount_ptr: u64);
        pub fn promise_batch_action_stake(
            promise_index: u64,
            amount_ptr: u64,
            public_key_len: u64,
            public_key_ptr: u64,
        );
        pub fn promise_batch_action_add_key_with_full_access(
            promise_index: u64,
            public_key_len: u64,
            public_key_ptr: u64,
            nonce: u64,
        );
        pub fn promise_batch_action_add_key_with_function_call(
            promise_index: u64,
            public_key_len: u64,
            public_key_ptr: u64,
            nonce: u64,
            allowance_ptr: u64,
            receiver_id_len: u64,
            receiver_id_ptr: u64,
            method_names_len: u64,
            method_names_ptr: u64,
        );
        pub fn promise_batch_action_delete_key(
            promise_index: u64,
            public_key_len: u64,
            public_key_ptr: u64,
        );
        pub fn promise_batch_action_delete_account(
            promise_index: u64,
            beneficiary_id_len: u64,
            beneficiary_id_ptr: u64,
        );

        // Storage
        pub fn storage_write(
            key_len: u64,
            key_ptr: u64,
            value_len: u64,
            value_ptr: u64,
            register_id: u64,
        ) -> u64;
        pub fn storage_read(key_len: u64, key_ptr: u64, register_id: u64) -> u64;
        pub fn storage_remove(key_len: u64, key_ptr: u64, register_id: u64) -> u64;
        pub fn storage_has_key(key_len: u64, key_ptr: u64) -> u64;
    }
}

/// `(len, ptr)` of a byte slice in linear memory.
fn raw(bytes: &[u8]) -> (u64, u64) {
    (bytes.len() as u64, bytes.as_ptr() as u64)
}

/// Read a 16-byte little-endian amount written by `call`.
fn read_amount(call: impl FnOnce(u64)) -> u128 {
    let mut buf = [0u8; 16];
    call(buf.as_mut_ptr() as u64);
    u128::from_le_bytes(buf)
}

/// The host of a contract compiled to `wasm32`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmHost;

impl WasmHost {
    /// Handle on the VM imports.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

// SAFETY (whole impl): every pointer handed to the VM comes from a live
// slice or stack buffer that outlives the call, with the matching length.
#[allow(unsafe_code)]
impl HostApi for WasmHost {
    fn read_register(&mut self, register_id: u64) -> HostResult<Vec<u8>> {
        let len = self.register_len(register_id)?;
        if len == u64::MAX {
            return Err(Trap::RegisterNotPopulated(register_id));
        }
        let len = usize::try_from(len).map_err(|_| Trap::RegisterNotPopulated(register_id))?;
        let mut buf = vec![0u8; len];
        unsafe { sys::read_register(register_id, buf.as_mut_ptr() as u64) };
        Ok(buf)
    }

    fn register_len(&mut self, register_id: u64) -> HostResult<u64> {
        Ok(unsafe { sys::register_len(register_id) })
    }

    fn current_account_id(&mut self, register_id: u64) -> HostResult<()> {
        unsafe { sys::current_account_id(register_id) };
        Ok(())
    }

    fn signer_account_id(&mut self, register_id: u64) -> HostResult<()> {
        unsafe { sys::signer_account_id(register_id) };
        Ok(())
    }

    fn signer_account_pk(&mut self, register_id: u64) -> HostResult<()> {
        unsafe { sys::signer_account_pk(register_id) };
        Ok(())
    }

    fn predecessor_account_id(&mut self, register_id: u64) -> HostResult<()> {
        unsafe { sys::predecessor_account_id(register_id) };
        Ok(())
    }

    fn input(&mut self, register_id: u64) -> HostResult<()> {
        unsafe { sys::input(register_id) };
        Ok(())
    }

    fn block_index(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::block_index() })
    }

    fn block_timestamp(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::block_timestamp() })
    }

    fn epoch_height(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::epoch_height() })
    }

    fn storage_usage(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::storage_usage() })
    }

    fn account_balance(&mut self) -> HostResult<u128> {
        Ok(read_amount(|ptr| unsafe { sys::account_balance(ptr) }))
    }

    fn account_locked_balance(&mut self) -> HostResult<u128> {
        Ok(read_amount(|ptr| unsafe { sys::account_locked_balance(ptr) }))
    }

    fn attached_deposit(&mut self) -> HostResult<u128> {
        Ok(read_amount(|ptr| unsafe { sys::attached_deposit(ptr) }))
    }

    fn prepaid_gas(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::prepaid_gas() })
    }

    fn used_gas(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::used_gas() })
    }

    fn random_seed(&mut self, register_id: u64) -> HostResult<()> {
        unsafe { sys::random_seed(register_id) };
        Ok(())
    }

    fn validator_stake(&mut self, account_id: &str) -> HostResult<u128> {
        let (len, ptr) = raw(account_id.as_bytes());
        Ok(read_amount(|out| unsafe { sys::validator_stake(len, ptr, out) }))
    }

    fn validator_total_stake(&mut self) -> HostResult<u128> {
        Ok(read_amount(|ptr| unsafe { sys::validator_total_stake(ptr) }))
    }

    fn sha256(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::sha256(len, ptr, register_id) };
        Ok(())
    }

    fn keccak256(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::keccak256(len, ptr, register_id) };
        Ok(())
    }

    fn keccak512(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::keccak512(len, ptr, register_id) };
        Ok(())
    }

    fn ripemd160(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::ripemd160(len, ptr, register_id) };
        Ok(())
    }

    fn ecrecover(
        &mut self,
        hash: &[u8],
        signature: &[u8],
        v: u64,
        malleability_flag: u64,
        register_id: u64,
    ) -> HostResult<u64> {
        let (hash_len, hash_ptr) = raw(hash);
        let (sig_len, sig_ptr) = raw(signature);
        Ok(unsafe {
            sys::ecrecover(
                hash_len,
                hash_ptr,
                sig_len,
                sig_ptr,
                v,
                malleability_flag,
                register_id,
            )
        })
    }

    fn alt_bn128_g1_multiexp(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::alt_bn128_g1_multiexp(len, ptr, register_id) };
        Ok(())
    }

    fn alt_bn128_g1_sum(&mut self, value: &[u8], register_id: u64) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::alt_bn128_g1_sum(len, ptr, register_id) };
        Ok(())
    }

    fn alt_bn128_pairing_check(&mut self, value: &[u8]) -> HostResult<u64> {
        let (len, ptr) = raw(value);
        Ok(unsafe { sys::alt_bn128_pairing_check(len, ptr) })
    }

    fn value_return(&mut self, value: &[u8]) -> HostResult<()> {
        let (len, ptr) = raw(value);
        unsafe { sys::value_return(len, ptr) };
        Ok(())
    }

    fn panic_utf8(&mut self, message: &[u8]) -> Trap {
        let (len, ptr) = raw(message);
        unsafe { sys::panic_utf8(len, ptr) }
    }

    fn log_utf8(&mut self, message: &[u8]) -> HostResult<()> {
        let (len, ptr) = raw(message);
        unsafe { sys::log_utf8(len, ptr) };
        Ok(())
    }

    fn log_utf16(&mut self, message: &[u8]) -> HostResult<()> {
        let (len, ptr) = raw(message);
        unsafe { sys::log_utf16(len, ptr) };
        Ok(())
    }

    fn promise_create(
        &mut self,
        account_id: &str,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<u64> {
        let (account_len, account_ptr) = raw(account_id.as_bytes());
        let (method_len, method_ptr) = raw(method_name.as_bytes());
        let (args_len, args_ptr) = raw(arguments);
        let amount = amount.to_le_bytes();
        Ok(unsafe {
            sys::promise_create(
                account_len,
                account_ptr,
                method_len,
                method_ptr,
                args_len,
                args_ptr,
                amount.as_ptr() as u64,
                gas,
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
        let (account_len, account_ptr) = raw(account_id.as_bytes());
        let (method_len, method_ptr) = raw(method_name.as_bytes());
        let (args_len, args_ptr) = raw(arguments);
        let amount = amount.to_le_bytes();
        Ok(unsafe {
            sys::promise_then(
                promise_index,
                account_len,
                account_ptr,
                method_len,
                method_ptr,
                args_len,
                args_ptr,
                amount.as_ptr() as u64,
                gas,
            )
        })
    }

    fn promise_and(&mut self, promise_indices: &[u64]) -> HostResult<u64> {
        Ok(unsafe {
            sys::promise_and(promise_indices.as_ptr() as u64, promise_indices.len() as u64)
        })
    }

    fn promise_batch_create(&mut self, account_id: &str) -> HostResult<u64> {
        let (len, ptr) = raw(account_id.as_bytes());
        Ok(unsafe { sys::promise_batch_create(len, ptr) })
    }

    fn promise_batch_then(&mut self, promise_index: u64, account_id: &str) -> HostResult<u64> {
        let (len, ptr) = raw(account_id.as_bytes());
        Ok(unsafe { sys::promise_batch_then(promise_index, len, ptr) })
    }

    fn promise_results_count(&mut self) -> HostResult<u64> {
        Ok(unsafe { sys::promise_results_count() })
    }

    fn promise_result(&mut self, result_idx: u64, register_id: u64) -> HostResult<u64> {
        Ok(unsafe { sys::promise_result(result_idx, register_id) })
    }

    fn promise_return(&mut self, promise_index: u64) -> HostResult<()> {
        unsafe { sys::promise_return(promise_index) };
        Ok(())
    }

    fn promise_batch_action_create_account(&mut self, promise_index: u64) -> HostResult<()> {
        unsafe { sys::promise_batch_action_create_account(promise_index) };
        Ok(())
    }

    fn promise_batch_action_deploy_contract(
        &mut self,
        promise_index: u64,
        code: &[u8],
    ) -> HostResult<()> {
        let (len, ptr) = raw(code);
        unsafe { sys::promise_batch_action_deploy_contract(promise_index, len, ptr) };
        Ok(())
    }

    fn promise_batch_action_function_call(
        &mut self,
        promise_index: u64,
        method_name: &str,
        arguments: &[u8],
        amount: u128,
        gas: u64,
    ) -> HostResult<()> {
        let (method_len, method_ptr) = raw(method_name.as_bytes());
        let (args_len, args_ptr) = raw(arguments);
        let amount = amount.to_le_bytes();
        unsafe {
            sys::promise_batch_action_function_call(
                promise_index,
                method_len,
                method_ptr,
                args_len,
                args_ptr,
                amount.as_ptr() as u64,
                gas,
            );
        }
        Ok(())
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
        let (method_len, method_ptr) = raw(method_name.as_bytes());
        let (args_len, args_ptr) = raw(arguments);
        let amount = amount.to_le_bytes();
        unsafe {
            sys::promise_batch_action_function_call_weight(
                promise_index,
                method_len,
                method_ptr,
                args_len,
                args_ptr,
                amount.as_ptr() as u64,
                gas,
                weight,
            );
        }
        Ok(())
    }

    fn promise_batch_action_transfer(&mut self, promise_index: u64, amount: u128) -> HostResult<()> {
        let amount = amount.to_le_bytes();
        unsafe { sys::promise_batch_action_transfer(promise_index, amount.as_ptr() as u64) };
        Ok(())
    }

    fn promise_batch_action_stake(
        &mut self,
        promise_index: u64,
        amount: u128,
        public_key: &[u8],
    ) -> HostResult<()> {
        let amount = amount.to_le_bytes();
        let (key_len, key_ptr) = raw(public_key);
        unsafe {
            sys::promise_batch_action_stake(promise_index, amount.as_ptr() as u64, key_len, key_ptr);
        }
        Ok(())
    }

    fn promise_batch_action_add_key_with_full_access(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
        nonce: u64,
    ) -> HostResult<()> {
        let (key_len, key_ptr) = raw(public_key);
        unsafe {
            sys::promise_batch_action_add_key_with_full_access(promise_index, key_len, key_ptr, nonce);
        }
        Ok(())
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
        let (key_len, key_ptr) = raw(public_key);
        let allowance = allowance.to_le_bytes();
        let (receiver_len, receiver_ptr) = raw(receiver_id.as_bytes());
        let (names_len, names_ptr) = raw(method_names.as_bytes());
        unsafe {
            sys::promise_batch_action_add_key_with_function_call(
                promise_index,
                key_len,
                key_ptr,
                nonce,
                allowance.as_ptr() as u64,
                receiver_len,
                receiver_ptr,
                names_len,
                names_ptr,
            );
        }
        Ok(())
    }

    fn promise_batch_action_delete_key(
        &mut self,
        promise_index: u64,
        public_key: &[u8],
    ) -> HostResult<()> {
        let (key_len, key_ptr) = raw(public_key);
        unsafe { sys::promise_batch_action_delete_key(promise_index, key_len, key_ptr) };
        Ok(())
    }

    fn promise_batch_action_delete_account(
        &mut self,
        promise_index: u64,
        beneficiary_id: &str,
    ) -> HostResult<()> {
        let (len, ptr) = raw(beneficiary_id.as_bytes());
        unsafe { sys::promise_batch_action_delete_account(promise_index, len, ptr) };
        Ok(())
    }

    fn storage_write(&mut self, key: &[u8], value: &[u8], register_id: u64) -> HostResult<u64> {
        let (key_len, key_ptr) = raw(key);
        let (value_len, value_ptr) = raw(value);
        Ok(unsafe { sys::storage_write(key_len, key_ptr, value_len, value_ptr, register_id) })
    }

    fn storage_read(&mut self, key: &[u8], register_id: u64) -> HostResult<u64> {
        let (len, ptr) = raw(key);
        Ok(unsafe { sys::storage_read(len, ptr, register_id) })
    }

    fn storage_remove(&mut self, key: &[u8], register_id: u64) -> HostResult<u64> {
        let (len, ptr) = raw(key);
        Ok(unsafe { sys::storage_remove(len, ptr, register_id) })
    }

    fn storage_has_key(&mut self, key: &[u8]) -> HostResult<u64> {
        let (len, ptr) = raw(key);
        Ok(unsafe { sys::storage_has_key(len, ptr) })
    }
}
